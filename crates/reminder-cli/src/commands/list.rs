//! List command

use clap::Args;
use reminder_core::context::CallContext;
use reminder_core::query::ListFilter;
use reminder_engine::Services;

use crate::commands::Output;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// all | completed | pending
    #[arg(long, default_value = "all")]
    pub filter: ListFilter,

    /// Page size; the configured default when omitted
    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// `next_cursor` from the previous page
    #[arg(long, allow_negative_numbers = true)]
    pub cursor: Option<i64>,
}

pub fn execute(
    services: &Services,
    args: ListArgs,
    ctx: &CallContext,
) -> Result<Output, Box<dyn std::error::Error>> {
    let request = services.list.request(args.limit, args.cursor, args.filter);
    let page = services.list.list(&request, ctx)?;
    Ok(serde_json::to_value(page)?)
}
