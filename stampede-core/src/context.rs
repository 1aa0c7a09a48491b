//! Authenticated session state
//!
//! `SessionContext` is the server-derived parameter set every later call
//! depends on. It is built once per virtual user by the bootstrapper and
//! never shared across users.

use crate::extract::SessionInfo;
use serde_json::{Map, Value as JsonValue};

/// Server-derived session parameters for one virtual user
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub user_id: i64,
    pub company_id: i64,
    pub allowed_company_ids: Vec<i64>,
    pub lang: String,
    pub tz: String,
    /// Action id of the landing view resolved from the menu tree
    pub primary_action_id: i64,
    /// Additional context keys merged from the landing action
    extra: Map<String, JsonValue>,
}

impl SessionContext {
    /// Build the context from the introspected session info and the
    /// resolved landing action.
    pub fn new(info: &SessionInfo, primary_action_id: i64) -> Self {
        Self {
            user_id: info.uid,
            company_id: info.company_id,
            allowed_company_ids: vec![info.company_id],
            lang: info.user_context.lang.clone(),
            tz: info.user_context.tz.clone(),
            primary_action_id,
            extra: Map::new(),
        }
    }

    /// Merge action-provided context keys; later keys override earlier ones
    pub fn merge(&mut self, extra: &Map<String, JsonValue>) {
        for (key, value) in extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    /// Look up a merged extension key
    pub fn extra(&self, key: &str) -> Option<&JsonValue> {
        self.extra.get(key)
    }

    /// The context mapping sent with RPC calls, base fields plus merged keys
    pub fn to_rpc_context(&self) -> JsonValue {
        let mut context = Map::new();
        context.insert("uid".into(), self.user_id.into());
        context.insert("company_id".into(), self.company_id.into());
        context.insert(
            "allowed_company_ids".into(),
            self.allowed_company_ids.clone().into(),
        );
        context.insert("lang".into(), self.lang.clone().into());
        context.insert("tz".into(), self.tz.clone().into());
        for (key, value) in &self.extra {
            context.insert(key.clone(), value.clone());
        }
        JsonValue::Object(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{CacheHashes, UserContext};
    use serde_json::json;

    fn sample_info() -> SessionInfo {
        SessionInfo {
            uid: 7,
            company_id: 1,
            user_context: UserContext {
                lang: "en_US".to_string(),
                tz: "UTC".to_string(),
            },
            cache_hashes: CacheHashes {
                load_menus: "abc".to_string(),
            },
        }
    }

    #[test]
    fn test_context_mirrors_session_info() {
        let ctx = SessionContext::new(&sample_info(), 42);
        assert_eq!(ctx.user_id, 7);
        assert_eq!(ctx.company_id, 1);
        assert_eq!(ctx.allowed_company_ids, vec![1]);
        assert_eq!(ctx.lang, "en_US");
        assert_eq!(ctx.tz, "UTC");
        assert_eq!(ctx.primary_action_id, 42);
    }

    #[test]
    fn test_merge_later_keys_override() {
        let mut ctx = SessionContext::new(&sample_info(), 42);

        let first = json!({"default_team_id": 1, "search_default_mine": true});
        ctx.merge(first.as_object().unwrap());
        let second = json!({"default_team_id": 5});
        ctx.merge(second.as_object().unwrap());

        assert_eq!(ctx.extra("default_team_id"), Some(&json!(5)));
        assert_eq!(ctx.extra("search_default_mine"), Some(&json!(true)));
    }

    #[test]
    fn test_rpc_context_shape() {
        let mut ctx = SessionContext::new(&sample_info(), 42);
        let extra = json!({"default_team_id": 5});
        ctx.merge(extra.as_object().unwrap());

        let rpc = ctx.to_rpc_context();
        assert_eq!(rpc["uid"], 7);
        assert_eq!(rpc["company_id"], 1);
        assert_eq!(rpc["allowed_company_ids"], json!([1]));
        assert_eq!(rpc["lang"], "en_US");
        assert_eq!(rpc["tz"], "UTC");
        assert_eq!(rpc["default_team_id"], 5);
    }
}
