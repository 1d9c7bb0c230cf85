//! Test world for Cucumber scenarios

use std::fmt;

use cucumber::World;
use serde_json::Value;

use crate::common::{TestApp, TestResponse};

/// Test world that maintains state across scenario steps
#[derive(Default, World)]
pub struct TestWorld {
    /// Application under test, started by a `Given` step
    pub app: Option<TestApp>,

    /// Response from last API call
    pub last_response: Option<TestResponse>,
}

impl fmt::Debug for TestWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestWorld")
            .field("started", &self.app.is_some())
            .field(
                "last_status",
                &self.last_response.as_ref().map(|r| r.status),
            )
            .finish()
    }
}

impl TestWorld {
    /// The running application, panicking if no scenario step started one
    pub fn app(&self) -> &TestApp {
        self.app
            .as_ref()
            .expect("scenario must start the audit service first")
    }

    pub fn response(&self) -> &TestResponse {
        self.last_response.as_ref().expect("No response available")
    }

    pub fn response_json(&self) -> Value {
        self.response().json()
    }

    pub fn results(&self) -> Vec<Value> {
        self.response_json()["results"]
            .as_array()
            .cloned()
            .unwrap_or_default()
    }
}
