//! Browse flow: open the pipeline kanban and expand each column
//!
//! Re-invokes the landing action the way the web client does on navigation,
//! reads the progress-bar aggregate and the grouped summary, then issues one
//! paginated detail read per returned group.

use crate::error::{SessionError, SessionResult};
use crate::flows::{many2one_id, Flow, FlowSession};
use serde_json::json;
use tracing::debug;

/// Field list the kanban view requests for every lead read
const KANBAN_FIELDS: &[&str] = &[
    "stage_id",
    "color",
    "priority",
    "expected_revenue",
    "kanban_state",
    "activity_date_deadline",
    "user_email",
    "user_id",
    "partner_id",
    "activity_summary",
    "active",
    "company_currency",
    "activity_state",
    "activity_ids",
    "name",
    "tag_ids",
    "activity_exception_decoration",
    "activity_exception_icon",
];

/// Page size of each per-column detail read
const COLUMN_PAGE_SIZE: u32 = 80;

pub struct CrmKanban;

#[async_trait::async_trait]
impl Flow for CrmKanban {
    fn name(&self) -> &'static str {
        "crm_kanban"
    }

    async fn run(&self, session: &mut FlowSession) -> SessionResult<()> {
        let uid = session.context.user_id;

        // Navigate back to the pipeline view
        session
            .rpc
            .run_action(session.context.primary_action_id)
            .await?;

        // Opaque filter: my opportunities only
        let domain = json!([
            "&",
            ["type", "=", "opportunity"],
            ["user_id", "=", uid],
        ]);

        session
            .rpc
            .call_kw(
                "crm.lead",
                "read_progress_bar",
                json!([]),
                json!({
                    "domain": domain.clone(),
                    "group_by": "stage_id",
                    "progress_bar": {
                        "field": "activity_state",
                        "colors": {
                            "planned": "success",
                            "today": "warning",
                            "overdue": "danger",
                        },
                        "sum_field": "expected_revenue",
                        "modifiers": {},
                    },
                }),
            )
            .await?;

        let grouped = session
            .rpc
            .call_kw(
                "crm.lead",
                "web_read_group",
                json!([]),
                json!({
                    "domain": domain,
                    "fields": KANBAN_FIELDS,
                    "groupby": ["stage_id"],
                    "orderby": "",
                    "lazy": true,
                }),
            )
            .await?;

        let groups = grouped
            .get("groups")
            .and_then(|groups| groups.as_array())
            .ok_or_else(|| {
                SessionError::DataAssumption("web_read_group returned no groups".into())
            })?;
        debug!(columns = groups.len(), "expanding kanban columns");

        for group in groups {
            let stage_id = group
                .get("stage_id")
                .and_then(many2one_id)
                .ok_or_else(|| {
                    SessionError::DataAssumption("group without a stage_id pair".into())
                })?;

            session
                .rpc
                .search_read(json!({
                    "model": "crm.lead",
                    "domain": [
                        "&",
                        ["stage_id", "=", stage_id],
                        "&",
                        ["type", "=", "opportunity"],
                        ["user_id", "=", uid],
                    ],
                    "fields": KANBAN_FIELDS,
                    "limit": COLUMN_PAGE_SIZE,
                    "sort": "",
                    "context": { "bin_size": true },
                }))
                .await?;
        }

        Ok(())
    }
}
