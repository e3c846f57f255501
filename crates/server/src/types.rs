use serde::{Deserialize, Serialize};

/// The envelope for every successful JSON response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: T,
}
