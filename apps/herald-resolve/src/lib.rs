use std::{
	fs,
	path::{Path, PathBuf},
};

use clap::Parser;
use color_eyre::eyre;
use serde::{Deserialize, Serialize};

use herald_domain::{
	Audience, DraftAudienceFilter, FetchOptions, GroupAudienceFilter, IndividualAudienceFilter,
	SendAudienceFilter,
};
use herald_service::{AudiencePage, HeraldService};
use herald_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = herald_cli::VERSION,
	rename_all = "kebab",
	styles = herald_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSON resolve request: `{"kind": "group" | "individual" | "draft" | "send", ...}`.
	#[arg(long, short = 'f', value_name = "FILE")]
	pub filter: PathBuf,
	/// Print only the total number of recipients.
	#[arg(long)]
	pub count_only: bool,
	/// Create the audience tables before resolving; meant for local fixtures.
	#[arg(long)]
	pub ensure_schema: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveRequest {
	Group {
		filter: GroupAudienceFilter,
		#[serde(default)]
		options: FetchOptions,
	},
	Individual {
		filter: IndividualAudienceFilter,
	},
	Draft {
		filter: DraftAudienceFilter,
		#[serde(default)]
		options: FetchOptions,
	},
	Send {
		filter: SendAudienceFilter,
		#[serde(default)]
		options: FetchOptions,
	},
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ResolveOutput {
	Page(AudiencePage),
	Audiences { audiences: Vec<Audience> },
	Count { total: u32 },
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = herald_config::load(&args.config)?;

	herald_cli::init_tracing(&config.service.log_level);

	let request = load_request(&args.filter)?;
	let db = Db::connect(&config.storage.postgres).await?;

	if args.ensure_schema {
		db.ensure_schema().await?;
	}

	let service = HeraldService::new(config, db);

	tracing::info!(
		filter = %args.filter.display(),
		count_only = args.count_only,
		"Resolving audience."
	);

	let output = resolve(&service, request, args.count_only).await?;
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

pub fn load_request(path: &Path) -> color_eyre::Result<ResolveRequest> {
	let raw = fs::read_to_string(path)
		.map_err(|err| eyre::eyre!("Failed to read request {}: {err}.", path.display()))?;

	parse_request(&raw).map_err(|err| eyre::eyre!("Invalid request {}: {err}", path.display()))
}

pub fn parse_request(raw: &str) -> serde_json::Result<ResolveRequest> {
	serde_json::from_str(raw)
}

async fn resolve(
	service: &HeraldService,
	request: ResolveRequest,
	count_only: bool,
) -> color_eyre::Result<ResolveOutput> {
	let output = match (request, count_only) {
		(ResolveRequest::Group { filter, .. }, true) =>
			ResolveOutput::Count { total: service.count_group_audiences(filter).await? },
		(ResolveRequest::Group { filter, options }, false) =>
			ResolveOutput::Page(service.find_group_audiences_with_paging(filter, options).await?),
		(ResolveRequest::Draft { filter, .. }, true) =>
			ResolveOutput::Count { total: service.count_draft_audiences(filter).await? },
		(ResolveRequest::Draft { filter, options }, false) =>
			ResolveOutput::Page(service.find_draft_audiences_with_paging(filter, options).await?),
		(ResolveRequest::Send { filter, .. }, true) =>
			ResolveOutput::Count { total: service.count_audiences(filter).await? },
		(ResolveRequest::Send { filter, options }, false) =>
			ResolveOutput::Audiences { audiences: service.find_audiences(filter, options).await? },
		(ResolveRequest::Individual { filter }, count_only) => {
			let audiences = service.find_individual_audiences(filter).await?;

			if count_only {
				let total = u32::try_from(audiences.len())
					.map_err(|_| eyre::eyre!("Audience count does not fit in u32."))?;

				ResolveOutput::Count { total }
			} else {
				ResolveOutput::Audiences { audiences }
			}
		},
	};

	Ok(output)
}
