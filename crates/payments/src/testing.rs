//! In-memory payment provider for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    CheckoutParams, CheckoutSession, PaymentError, PaymentProvider, SessionDetails, PAID,
};

/// Provider that records created sessions and reports a configurable status.
#[derive(Debug, Default)]
pub struct FakeProvider {
    sessions: Mutex<Vec<CheckoutParams>>,
    status: Mutex<Option<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payment status reported by [`PaymentProvider::get_session`], `"paid"` by default.
    pub fn set_status(&self, status: &str) {
        *self.status.lock().unwrap() = Some(status.to_owned());
    }

    /// All sessions created so far.
    pub fn sessions(&self) -> Vec<CheckoutParams> {
        self.sessions.lock().unwrap().clone()
    }

    fn session_id(index: usize) -> String {
        format!("cs_test_{}", index + 1)
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_session(
        &self,
        params: &CheckoutParams,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut sessions = self.sessions.lock().unwrap();
        let id = Self::session_id(sessions.len());
        sessions.push(params.clone());

        Ok(CheckoutSession {
            url: format!("https://checkout.example.org/pay/{id}"),
            id,
        })
    }

    async fn get_session(&self, session_id: &str) -> Result<SessionDetails, PaymentError> {
        let sessions = self.sessions.lock().unwrap();
        let params = sessions
            .iter()
            .enumerate()
            .find(|(index, _)| Self::session_id(*index) == session_id)
            .map(|(_, params)| params)
            .ok_or_else(|| PaymentError::SessionNotFound(session_id.to_owned()))?;

        let status = self
            .status
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| String::from(PAID));

        Ok(SessionDetails {
            status,
            client_reference_id: Some(params.client_reference_id.clone()),
            customer_id: Some(String::from("cus_test")),
            customer_email: params.customer_email.clone(),
        })
    }
}
