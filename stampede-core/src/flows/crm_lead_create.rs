//! Create flow: pick a contact and file a new opportunity
//!
//! Searches for candidate partners, samples one, lets the server resolve the
//! dependent field values through an `onchange` triggered by `partner_id`,
//! then submits the creation with a randomized expected revenue. Models a
//! user filling a form whose fields auto-populate from the chosen contact.

use crate::error::{SessionError, SessionResult};
use crate::flows::{many2one_id, Flow, FlowSession};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

/// How many partner candidates the lookup asks for
const PARTNER_CANDIDATES: u32 = 8;

pub struct CrmLeadCreate;

#[async_trait::async_trait]
impl Flow for CrmLeadCreate {
    fn name(&self) -> &'static str {
        "crm_lead_create"
    }

    async fn run(&self, session: &mut FlowSession) -> SessionResult<()> {
        let uid = session.context.user_id;
        let company_id = session.context.company_id;

        // The sales-team default comes from the landing action's context.
        // If the action never supplied it the session cannot file leads the
        // way the web client would; fail the iteration rather than guess.
        let team_id = session
            .context
            .extra("default_team_id")
            .and_then(|team| team.as_i64())
            .ok_or_else(|| {
                SessionError::DataAssumption(
                    "default_team_id missing from the action context".into(),
                )
            })?;

        let partners = session
            .rpc
            .call_kw(
                "res.partner",
                "name_search",
                json!([]),
                json!({
                    "name": "",
                    "args": ["|", ["company_id", "=", false], ["company_id", "=", company_id]],
                    "operator": "ilike",
                    "limit": PARTNER_CANDIDATES,
                }),
            )
            .await?;
        let partners = partners.as_array().ok_or_else(|| {
            SessionError::DataAssumption("name_search did not return a list".into())
        })?;

        let candidate = partners.choose(&mut session.rng).ok_or_else(|| {
            SessionError::DataAssumption("no partner candidates to sample from".into())
        })?;
        let partner_id = many2one_id(candidate).ok_or_else(|| {
            SessionError::DataAssumption("malformed name_search entry".into())
        })?;
        debug!(partner_id, "sampled partner");

        // Server-side field-dependency resolution, triggered by partner_id
        let baseline = json!({
            "partner_id": partner_id,
            "company_id": company_id,
            "user_id": uid,
            "team_id": team_id,
            "name": false,
            "email_from": false,
            "phone": false,
            "expected_revenue": 0,
            "priority": "0",
            "company_currency": 1,
            "type": "opportunity",
            "partner_name": false,
            "contact_name": false,
            "country_id": false,
            "state_id": false,
            "city": false,
            "street": false,
            "street2": false,
            "zip": false,
            "mobile": false,
            "website": false,
            "function": false,
            "title": false,
        });
        let onchange_spec = json!({
            "partner_id": "1",
            "name": "",
            "email_from": "",
            "phone": "1",
            "expected_revenue": "",
            "priority": "",
            "company_currency": "",
            "company_id": "1",
            "user_id": "1",
            "team_id": "",
            "type": "1",
            "partner_name": "",
            "contact_name": "",
            "country_id": "1",
            "state_id": "",
            "city": "",
            "street": "",
            "street2": "",
            "zip": "1",
            "mobile": "1",
            "website": "",
            "function": "",
            "title": "",
        });

        let resolved = session
            .rpc
            .call_kw(
                "crm.lead",
                "onchange",
                json!([[], baseline, "partner_id", onchange_spec]),
                json!({}),
            )
            .await?;
        let values = resolved
            .get("value")
            .and_then(|value| value.as_object())
            .cloned()
            .unwrap_or_default();

        let field = |name: &str| values.get(name).cloned().unwrap_or(JsonValue::Bool(false));
        let relation = |name: &str| {
            values
                .get(name)
                .and_then(many2one_id)
                .map(JsonValue::from)
                .unwrap_or(JsonValue::Bool(false))
        };

        // Bounded amount, rounded to a fixed step
        let expected_revenue = session.rng.random_range(1..1000) * 1000;

        let created = session
            .rpc
            .call_kw(
                "crm.lead",
                "create",
                json!([{
                    "type": "opportunity",
                    "expected_revenue": expected_revenue,
                    "company_id": company_id,
                    "user_id": uid,
                    "team_id": team_id,
                    "priority": "0",
                    "partner_id": partner_id,
                    "name": field("name"),
                    "email_from": field("email_from"),
                    "phone": field("phone"),
                    "partner_name": field("partner_name"),
                    "contact_name": field("contact_name"),
                    "country_id": relation("country_id"),
                    "state_id": relation("state_id"),
                    "city": field("city"),
                    "street": field("street"),
                    "street2": field("street2"),
                    "zip": field("zip"),
                    "function": field("function"),
                    "title": field("title"),
                }]),
                json!({}),
            )
            .await?;

        if let Some(lead_id) = created.as_i64() {
            debug!(lead_id, "created crm lead");
        }
        Ok(())
    }
}
