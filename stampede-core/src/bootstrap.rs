//! One-time session establishment
//!
//! Real application sessions require a multi-step negotiation before any
//! business call is valid: anti-forgery token, credentials, session
//! introspection, menu resolution, then the landing action's context. The
//! sequence here is strict; skipping a step produces server-side context
//! errors on every subsequent call.

use crate::context::SessionContext;
use crate::error::{SessionError, SessionResult};
use crate::extract::PageExtractor;
use crate::rpc::RpcClient;
use serde_json::{json, Value as JsonValue};
use stampede_config::TargetConfig;
use stampede_http::Transport;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs the authentication and context-derivation sequence for one user
pub struct Bootstrapper {
    transport: Arc<dyn Transport>,
    extractor: Arc<dyn PageExtractor>,
    login: String,
    password: String,
    menu_label: String,
}

impl Bootstrapper {
    pub fn new(
        transport: Arc<dyn Transport>,
        extractor: Arc<dyn PageExtractor>,
        target: &TargetConfig,
    ) -> Self {
        Self {
            transport,
            extractor,
            login: target.login.clone(),
            password: target.password.clone(),
            menu_label: target.menu_label.clone(),
        }
    }

    /// Execute the full bootstrap sequence and produce the session context.
    ///
    /// Any failure here is fatal to the virtual user's run: without a valid
    /// session no flow can execute.
    pub async fn bootstrap(&self, rpc: &mut RpcClient) -> SessionResult<SessionContext> {
        // Unauthenticated -> TokenFetched
        let response = self.transport.get("/web/login", &[]).await?;
        if !response.is_success() {
            return Err(SessionError::Bootstrap(format!(
                "login page returned status {}",
                response.status
            )));
        }
        let token = self.extractor.csrf_token(&response.body)?;
        debug!("csrf token extracted");

        // TokenFetched -> LoggedIn
        let form = [
            ("csrf_token".to_string(), token),
            ("login".to_string(), self.login.clone()),
            ("password".to_string(), self.password.clone()),
            ("redirect".to_string(), String::new()),
        ];
        let response = self.transport.post_form("/web/login", &form).await?;
        if !response.is_success() {
            return Err(SessionError::Auth(format!(
                "login rejected with status {}",
                response.status
            )));
        }

        // LoggedIn -> SessionIntrospected
        let response = self.transport.get("/web", &[]).await?;
        if !response.is_success() {
            return Err(SessionError::Bootstrap(format!(
                "landing page returned status {}",
                response.status
            )));
        }
        let info = self.extractor.session_info(&response.body)?;
        debug!(uid = info.uid, company_id = info.company_id, "session introspected");

        // SessionIntrospected -> MenusResolved
        let menus_path = format!(
            "/web/webclient/load_menus/{}",
            info.cache_hashes.load_menus
        );
        let response = self.transport.get(&menus_path, &[]).await?;
        if !response.is_success() {
            return Err(SessionError::Bootstrap(format!(
                "menu tree fetch returned status {}",
                response.status
            )));
        }
        let menus: JsonValue = serde_json::from_str(&response.body)
            .map_err(|e| SessionError::Bootstrap(format!("menu tree is malformed: {}", e)))?;
        let action_id = resolve_menu_action(&menus, &self.menu_label)?;
        debug!(action_id, menu = %self.menu_label, "landing action resolved");

        // MenusResolved -> ContextFinalized
        let mut context = SessionContext::new(&info, action_id);

        // Smoke-check the session with a real business call and the avatar read
        rpc.call_kw(
            "res.users",
            "systray_get_activities",
            json!([]),
            json!({ "context": context.to_rpc_context() }),
        )
        .await?;

        let query = [
            ("model".to_string(), "res.users".to_string()),
            ("field".to_string(), "image_128".to_string()),
            ("id".to_string(), context.user_id.to_string()),
        ];
        let response = self.transport.get("/web/image", &query).await?;
        if !response.is_success() {
            return Err(SessionError::Bootstrap(format!(
                "avatar fetch returned status {}",
                response.status
            )));
        }

        // Run the landing action and fold its context into the session
        let result = rpc.run_action(action_id).await?;
        let action_context = result
            .get("context")
            .and_then(|context| context.as_object())
            .ok_or_else(|| {
                SessionError::Bootstrap(format!("action {} returned no context", action_id))
            })?;
        context.merge(action_context);

        info!(
            uid = context.user_id,
            action_id, "session bootstrap complete"
        );
        Ok(context)
    }
}

/// Find the menu entry with the given display name and extract its action id.
///
/// Action references look like `"ir.actions.act_window,42"`; the id is the
/// component after the comma.
fn resolve_menu_action(menus: &JsonValue, label: &str) -> SessionResult<i64> {
    let children = menus
        .get("children")
        .and_then(|children| children.as_array())
        .ok_or_else(|| SessionError::Bootstrap("menu tree has no children".into()))?;

    let entry = children
        .iter()
        .find(|child| child.get("name").and_then(|name| name.as_str()) == Some(label))
        .ok_or_else(|| SessionError::MenuNotFound(label.to_string()))?;

    let action = entry
        .get("action")
        .and_then(|action| action.as_str())
        .ok_or_else(|| {
            SessionError::MenuNotFound(format!("menu entry {} carries no action", label))
        })?;

    let id = action.split(',').nth(1).ok_or_else(|| {
        SessionError::Bootstrap(format!("malformed action reference: {}", action))
    })?;
    id.parse().map_err(|_| {
        SessionError::Bootstrap(format!("malformed action reference: {}", action))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_menu_resolution_is_deterministic() {
        let menus = json!({
            "children": [
                {"name": "Discuss", "action": "ir.actions.act_window,7"},
                {"name": "CRM", "action": "ir.actions.act_window,42"},
                {"name": "Sales", "action": "ir.actions.act_window,55"},
            ]
        });
        assert_eq!(resolve_menu_action(&menus, "CRM").unwrap(), 42);
    }

    #[test]
    fn test_menu_resolution_missing_label() {
        let menus = json!({"children": [{"name": "Sales", "action": "ir.actions.act_window,55"}]});
        assert!(matches!(
            resolve_menu_action(&menus, "CRM"),
            Err(SessionError::MenuNotFound(_))
        ));
    }

    #[test]
    fn test_menu_resolution_malformed_action() {
        let menus = json!({"children": [{"name": "CRM", "action": "no-comma-here"}]});
        assert!(matches!(
            resolve_menu_action(&menus, "CRM"),
            Err(SessionError::Bootstrap(_))
        ));
    }

    #[test]
    fn test_menu_resolution_empty_tree() {
        assert!(matches!(
            resolve_menu_action(&json!({}), "CRM"),
            Err(SessionError::Bootstrap(_))
        ));
    }
}
