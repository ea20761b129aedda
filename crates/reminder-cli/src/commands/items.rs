//! Item write and lookup commands

use chrono::{DateTime, Utc};
use clap::Args;
use reminder_core::context::CallContext;
use reminder_core::model::{ItemId, ItemUpdate, NewItem};
use reminder_engine::{ItemCommand, Services};

use crate::commands::Output;

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub description: String,

    /// Due time, RFC 3339 (e.g. 2024-05-01T09:00:00Z)
    #[arg(long, value_parser = parse_timestamp)]
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    pub id: ItemId,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: ItemId,

    #[arg(long)]
    pub description: String,

    /// New completion state; unchanged when omitted
    #[arg(long)]
    pub completed: Option<bool>,
}

#[derive(Debug, Args)]
pub struct CompleteArgs {
    pub id: ItemId,

    /// Completion time, RFC 3339; defaults to now
    #[arg(long, value_parser = parse_timestamp)]
    pub at: Option<DateTime<Utc>>,
}

pub fn add(
    services: &Services,
    args: AddArgs,
    ctx: &CallContext,
) -> Result<Output, Box<dyn std::error::Error>> {
    let result = services.items.apply(
        ItemCommand::Create(NewItem::new(args.description, args.deadline)),
        ctx,
    )?;
    Ok(serde_json::to_value(result)?)
}

pub fn get(
    services: &Services,
    args: IdArgs,
    ctx: &CallContext,
) -> Result<Output, Box<dyn std::error::Error>> {
    let item = services.items.get(args.id, ctx)?;
    Ok(serde_json::to_value(item)?)
}

pub fn update(
    services: &Services,
    args: UpdateArgs,
    ctx: &CallContext,
) -> Result<Output, Box<dyn std::error::Error>> {
    let current = services.items.get(args.id, ctx)?;
    let completed = args.completed.unwrap_or(current.completed);
    let update = ItemUpdate {
        description: args.description,
        completed,
        // Keep the original completion time unless the state flips
        finished_at: current.finished_at.filter(|_| completed),
    };
    let result = services
        .items
        .apply(ItemCommand::Update { id: args.id, update }, ctx)?;
    Ok(serde_json::to_value(result)?)
}

pub fn complete(
    services: &Services,
    args: CompleteArgs,
    ctx: &CallContext,
) -> Result<Output, Box<dyn std::error::Error>> {
    let result = services.items.apply(
        ItemCommand::SetStatus {
            id: args.id,
            completed: true,
            finished_at: args.at,
        },
        ctx,
    )?;
    Ok(serde_json::to_value(result)?)
}

pub fn reopen(
    services: &Services,
    args: IdArgs,
    ctx: &CallContext,
) -> Result<Output, Box<dyn std::error::Error>> {
    let result = services.items.apply(
        ItemCommand::SetStatus {
            id: args.id,
            completed: false,
            finished_at: None,
        },
        ctx,
    )?;
    Ok(serde_json::to_value(result)?)
}

pub fn delete(
    services: &Services,
    args: IdArgs,
    ctx: &CallContext,
) -> Result<Output, Box<dyn std::error::Error>> {
    let result = services
        .items
        .apply(ItemCommand::Delete { id: args.id }, ctx)?;
    Ok(serde_json::to_value(result)?)
}
