#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the healthcare chat server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the store's row types to allow independent evolution of the API
//! contract.

use healthcare_chat_database_models::{CountMap, NestedCountMap};
use serde::{Deserialize, Serialize};

/// Body of `POST /get-response`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The natural-language question.
    pub prompt: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// A plain status or error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Message text.
    pub message: String,
}

impl ApiMessage {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `GET /gender-count`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenderCountResponse {
    /// Patients per gender.
    pub gender_counts: CountMap,
}

/// `GET /blood-type-count`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BloodTypeCountResponse {
    /// Patients per blood type.
    pub blood_type_counts: CountMap,
}

/// `GET /blood-condition-count`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BloodConditionCountResponse {
    /// Blood type -> medical condition -> patients.
    pub blood_condition_counts: NestedCountMap,
}

/// `GET /gender-condition-count`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenderConditionCountResponse {
    /// Gender -> medical condition -> patients.
    pub gender_condition_counts: NestedCountMap,
}

/// `GET /admission-type-count`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdmissionTypeCountResponse {
    /// Patients per admission type.
    pub admission_type_counts: CountMap,
}

/// `GET /test-result-count`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestResultCountResponse {
    /// Patients per test result.
    pub test_result_counts: CountMap,
}
