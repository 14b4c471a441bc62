/// One entry of the account's vehicle list.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Vehicle {
    id_s: String,
    vin: Option<String>,
    display_name: Option<String>,
    state: Option<String>,
}

impl Vehicle {
    pub fn id(&self) -> &str { self.id_s.as_str() }
    pub fn vin(&self) -> Option<&str> { self.vin.as_deref() }
    pub fn display_name(&self) -> &str { self.display_name.as_deref().unwrap_or("Tesla") }
    pub fn is_asleep(&self) -> bool { self.state.as_deref() == Some("asleep") }
    /// Key for the persisted position record; VIN when known, API id otherwise.
    pub fn record_key(&self) -> &str { self.vin.as_deref().unwrap_or(self.id_s.as_str()) }
}
