use serde::{Deserialize, Serialize};

/// Whether a resource is offered online only or has a physical location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OnlineOnly {
    Yes,
    #[default]
    No,
}

impl OnlineOnly {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("yes") {
            OnlineOnly::Yes
        } else {
            OnlineOnly::No
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OnlineOnly::Yes => "yes",
            OnlineOnly::No => "no",
        }
    }
}

/// A canonical resource entry, independent of its original source schema.
/// Key text fields are stored lowercase-trimmed; absent source columns map to
/// empty strings so string operations stay total downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResourceRecord {
    pub province: String,
    pub city: String,
    pub address: String,
    /// One of the taxonomy values once classification has run.
    pub category: String,
    pub name: String,
    pub description: String,
    pub contact: String,
    /// Absent or malformed values are treated as "no link".
    pub link: Option<String>,
    /// Both populated or both absent, never exactly one.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub online_only: OnlineOnly,
}

impl ResourceRecord {
    /// The tuple deciding that two records are "the same" for deduplication.
    /// Address participates only when the sink's policy asks for the finer key.
    pub fn identity_key(&self, include_address: bool) -> (String, String, String, Option<String>) {
        (
            self.name.clone(),
            self.city.clone(),
            self.province.clone(),
            include_address.then(|| self.address.clone()),
        )
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Concatenated text the post-verification keyword pass matches against.
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.name, self.category, self.description)
    }
}
