use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Symbol;

/// Identity of a tracked company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(Uuid);

impl CompanyId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Display for CompanyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Descriptive fields downloadable from the provider's company endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDetails {
    pub name: String,
    pub exchange: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub chief_executive: Option<String>,
    pub security_name: Option<String>,
    pub issue_type: Option<String>,
    pub sector: Option<String>,
    pub employees: Option<u32>,
    pub tags: Vec<String>,
}

/// A tracked company. The store keys the company's quote series under its
/// id; quote rows cannot outlive the company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub symbol: Symbol,
    pub name: String,
    pub exchange: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub chief_executive: Option<String>,
    pub security_name: Option<String>,
    pub issue_type: Option<String>,
    pub sector: Option<String>,
    pub employees: Option<u32>,
    pub tags: Vec<String>,
    /// Opt-in to the quote synchronization pass.
    pub retrieve_quotes: bool,
    /// Opt-in to the next detail refresh pass; cleared once refreshed.
    pub download_details: bool,
}

impl Company {
    pub fn new(symbol: Symbol, name: impl Into<String>) -> Self {
        Self {
            id: CompanyId::generate(),
            symbol,
            name: name.into(),
            exchange: None,
            industry: None,
            website: None,
            description: None,
            chief_executive: None,
            security_name: None,
            issue_type: None,
            sector: None,
            employees: None,
            tags: Vec::new(),
            retrieve_quotes: false,
            download_details: false,
        }
    }

    /// Overwrite the descriptive fields with freshly downloaded values and
    /// clear the refresh flag.
    pub fn apply_details(&mut self, details: CompanyDetails) {
        self.name = details.name;
        self.exchange = details.exchange;
        self.industry = details.industry;
        self.website = details.website;
        self.description = details.description;
        self.chief_executive = details.chief_executive;
        self.security_name = details.security_name;
        self.issue_type = details.issue_type;
        self.sector = details.sector;
        self.employees = details.employees;
        self.tags = details.tags;
        self.download_details = false;
    }
}
