//! LDAP groups
//!
//! Read-only listing of the groups known to the instance's LDAP providers.
//! Requires administrator access.

use crate::gitlab::query::{encode_query, scalar, Query};
use crate::gitlab::Gitlab;
use crate::resource::{List, ListOptions, Manager, RestObject};

/// Manager for `/ldap/groups` and `/ldap/{provider}/groups`
#[derive(Debug, Clone)]
pub struct LdapGroupManager {
    client: Gitlab,
}

impl LdapGroupManager {
    pub(crate) fn new(client: Gitlab) -> Self {
        Self { client }
    }
}

impl Manager for LdapGroupManager {
    type Object = LdapGroup;

    fn client(&self) -> &Gitlab {
        &self.client
    }

    fn path(&self) -> &str {
        "/ldap/groups"
    }

    fn id_attr(&self) -> Option<&'static str> {
        None
    }

    fn list_filters(&self) -> &'static [&'static str] {
        &["search", "provider"]
    }

    fn wrap(&self, rest: RestObject) -> LdapGroup {
        LdapGroup {
            rest,
            manager: self.clone(),
        }
    }
}

impl List for LdapGroupManager {
    /// A `provider` filter scopes the path instead of the query
    fn list_request(&self, opts: &ListOptions) -> (String, Query) {
        let mut params = opts.page_params(&self.client);
        let provider = params.remove("provider").and_then(|v| scalar(&v));

        let path = match provider {
            Some(provider) => format!("/ldap/{}/groups", urlencoding::encode(&provider)),
            None => self.path().to_string(),
        };
        (path, encode_query(&params, self.array_attrs()))
    }
}

/// A group as seen by an LDAP provider
#[derive(Debug, Clone)]
pub struct LdapGroup {
    rest: RestObject,
    manager: LdapGroupManager,
}

resource_object!(LdapGroup, LdapGroupManager);

impl LdapGroup {
    /// Common name
    pub fn cn(&self) -> Option<&str> {
        self.rest.get_str("cn")
    }
}
