use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBody<T> {
    pub is_loading: bool,
    pub items: Vec<T>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SuccessBody {
    pub success: bool,
}

impl SuccessBody {
    pub fn new() -> SuccessBody {
        SuccessBody { success: true }
    }
}

impl Default for SuccessBody {
    fn default() -> SuccessBody {
        SuccessBody::new()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}
