use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An elastic public address owned by the account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Address {
    pub public_ip: String,
    pub allocation_id: String,
    /// Set while the address is attached to an instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl Address {
    pub fn new(public_ip: impl Into<String>, allocation_id: impl Into<String>) -> Self {
        Self {
            public_ip: public_ip.into(),
            allocation_id: allocation_id.into(),
            association_id: None,
            instance_id: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.association_id.as_deref().map_or(true, str::is_empty)
    }
}

/// Addresses not associated with any instance.
pub fn open_addresses(addresses: Vec<Address>) -> Vec<Address> {
    addresses.into_iter().filter(Address::is_open).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_addresses_filters_associated() {
        let mut attached = Address::new("198.51.100.2", "eipalloc-2");
        attached.association_id = Some("eipassoc-2".to_string());
        let mut blank = Address::new("198.51.100.3", "eipalloc-3");
        blank.association_id = Some(String::new());

        let open = open_addresses(vec![
            Address::new("198.51.100.1", "eipalloc-1"),
            attached,
            blank,
        ]);

        let ids: Vec<_> = open.iter().map(|a| a.allocation_id.as_str()).collect();
        assert_eq!(ids, vec!["eipalloc-1", "eipalloc-3"]);
    }
}
