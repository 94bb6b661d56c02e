//! Chat context adapters

use mcbe_news_domain::ChatContext;
use mcbe_news_domain::usecases::check::legacy_group_address;

/// Context identified by a `platform:MessageType:session` origin string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedOriginContext {
    origin: String,
}

impl UnifiedOriginContext {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }
}

impl ChatContext for UnifiedOriginContext {
    fn primary_address(&self) -> String {
        self.origin.clone()
    }

    /// Session component for group origins, otherwise the whole origin
    fn display_key(&self) -> String {
        if self.origin.contains("group") || self.origin.contains("Group") {
            let parts: Vec<&str> = self.origin.split(':').collect();
            if parts.len() >= 3 {
                return parts[2].to_string();
            }
        }
        self.origin.clone()
    }
}

/// Context known only by a bare group id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIdContext {
    group_id: String,
}

impl GroupIdContext {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
        }
    }
}

impl ChatContext for GroupIdContext {
    fn primary_address(&self) -> String {
        legacy_group_address(&self.group_id)
    }

    fn display_key(&self) -> String {
        self.group_id.clone()
    }
}
