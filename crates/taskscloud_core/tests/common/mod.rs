#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use taskscloud_core::{
    FederatedProvider, Identity, IdentityProvider, Navigator, Persistence, ProviderError,
    ProviderResult, Route, SessionObserver, SessionSubscription,
};

type ObserverMap = Arc<Mutex<HashMap<u64, SessionObserver>>>;

/// In-process identity provider that lets tests push session reports.
#[derive(Default)]
pub struct FakeIdentityProvider {
    observers: ObserverMap,
    next_id: AtomicU64,
    pub fail_sign_out: AtomicBool,
    pub fail_register: AtomicBool,
    pub sign_in_persistence: Mutex<Vec<Persistence>>,
    pub federated_calls: Mutex<Vec<FederatedProvider>>,
    pub sign_out_calls: Mutex<usize>,
    pub registered: Mutex<Vec<String>>,
    pub verification_sent: Mutex<Vec<String>>,
}

impl FakeIdentityProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Delivers `session` to every live observer.
    pub fn emit(&self, session: Option<Identity>) {
        let observers = self.observers.lock().unwrap();
        for observer in observers.values() {
            observer(session.clone());
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        self.observers.lock().unwrap().len()
    }

    fn identity_for(email: &str) -> Identity {
        let uid = format!("uid-{}", email.split('@').next().unwrap_or(email));
        Identity::new(uid).with_email(email)
    }
}

impl IdentityProvider for FakeIdentityProvider {
    fn observe_session(&self, observer: SessionObserver) -> SessionSubscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.observers.lock().unwrap().insert(id, observer);
        let observers = Arc::clone(&self.observers);
        SessionSubscription::new(move || {
            observers.lock().unwrap().remove(&id);
        })
    }

    fn sign_in_with_credential(
        &self,
        email: &str,
        password: &str,
        persistence: Persistence,
    ) -> ProviderResult<Identity> {
        self.sign_in_persistence.lock().unwrap().push(persistence);
        if password != "correct-horse" {
            return Err(ProviderError::new(
                "auth/wrong-password",
                "wrong password",
            ));
        }
        let identity = Self::identity_for(email);
        self.emit(Some(identity.clone()));
        Ok(identity)
    }

    fn sign_in_with_federated_provider(
        &self,
        provider: FederatedProvider,
        persistence: Persistence,
    ) -> ProviderResult<Identity> {
        self.sign_in_persistence.lock().unwrap().push(persistence);
        self.federated_calls.lock().unwrap().push(provider);
        let identity = Identity::new(format!("uid-{}", provider.provider_id()));
        self.emit(Some(identity.clone()));
        Ok(identity)
    }

    fn sign_out(&self) -> ProviderResult<()> {
        *self.sign_out_calls.lock().unwrap() += 1;
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(ProviderError::new("auth/network-request-failed", "offline"));
        }
        self.emit(None);
        Ok(())
    }

    fn register(&self, email: &str, _password: &str) -> ProviderResult<Identity> {
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(ProviderError::new(
                "auth/email-already-in-use",
                "email already in use",
            ));
        }
        self.registered.lock().unwrap().push(email.to_string());
        Ok(Self::identity_for(email))
    }

    fn send_verification_email(&self, identity: &Identity) -> ProviderResult<()> {
        self.verification_sent
            .lock()
            .unwrap()
            .push(identity.uid.to_string());
        Ok(())
    }
}

/// Navigator that records every redirect.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}
