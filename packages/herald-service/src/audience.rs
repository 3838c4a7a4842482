use serde::Serialize;

use herald_domain::{
	Audience, DraftAudienceFilter, FetchOptions, GroupAudienceFilter, IndividualAudienceFilter,
	OrderByName, Paging, SendAudienceFilter, Selector,
};
use herald_storage::{
	audience,
	compiler::{self, CompiledAudienceQuery},
};

use crate::{HeraldService, Result};

/// One page of recipients plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudiencePage {
	pub audiences: Vec<Audience>,
	pub total: u32,
}

impl HeraldService {
	pub async fn find_group_audiences_with_paging(
		&self,
		filter: GroupAudienceFilter,
		options: FetchOptions,
	) -> Result<AudiencePage> {
		let filter = prepare_group(&self.cfg.audience, filter)?;
		let compiled = compiler::compile_group(&filter, &paged_options(options));

		self.fetch_page(&compiled).await
	}

	pub async fn find_draft_audiences_with_paging(
		&self,
		filter: DraftAudienceFilter,
		options: FetchOptions,
	) -> Result<AudiencePage> {
		let filter = prepare_draft(&self.cfg.audience, filter)?;
		let compiled = compiler::compile_draft(&filter, &paged_options(options));

		self.fetch_page(&compiled).await
	}

	pub async fn find_individual_audiences(
		&self,
		filter: IndividualAudienceFilter,
	) -> Result<Vec<Audience>> {
		let audiences = audience::find_individual_audiences(&self.db.pool, &filter).await?;

		tracing::info!(audiences = audiences.len(), "Resolved individual audiences.");

		Ok(audiences)
	}

	/// Resolves every recipient of a notification at send time, unpaged.
	pub async fn find_audiences(
		&self,
		filter: SendAudienceFilter,
		options: FetchOptions,
	) -> Result<Vec<Audience>> {
		let filter = prepare_send(&self.cfg.audience, filter)?;
		let audiences = audience::find_send_audiences(&self.db.pool, &filter, &options).await?;

		tracing::info!(audiences = audiences.len(), "Resolved send audiences.");

		Ok(audiences)
	}

	pub async fn count_audiences(&self, filter: SendAudienceFilter) -> Result<u32> {
		let filter = prepare_send(&self.cfg.audience, filter)?;

		Ok(audience::count_send_audiences(&self.db.pool, &filter).await?)
	}

	pub async fn count_group_audiences(&self, filter: GroupAudienceFilter) -> Result<u32> {
		let filter = prepare_group(&self.cfg.audience, filter)?;

		Ok(audience::count_group_audiences(&self.db.pool, &filter).await?)
	}

	pub async fn count_draft_audiences(&self, filter: DraftAudienceFilter) -> Result<u32> {
		let filter = prepare_draft(&self.cfg.audience, filter)?;

		Ok(audience::count_draft_audiences(&self.db.pool, &filter).await?)
	}

	/// Fetch and count share one compilation and run concurrently on the pool.
	async fn fetch_page(&self, compiled: &CompiledAudienceQuery) -> Result<AudiencePage> {
		let (audiences, total) = tokio::try_join!(
			audience::fetch_audiences(&self.db.pool, compiled),
			audience::count_audiences(&self.db.pool, compiled),
		)?;

		tracing::info!(audiences = audiences.len(), total, "Resolved audience page.");

		Ok(AudiencePage { audiences, total })
	}
}

/// Validates a group filter and applies the configured defaults: enrolled-only targeting
/// and bounded paging.
pub fn prepare_group(
	cfg: &herald_config::Audience,
	mut filter: GroupAudienceFilter,
) -> Result<GroupAudienceFilter> {
	filter.validate()?;

	if cfg.enrolled_only && filter.enrollment_status.is_none() {
		filter.enrollment_status = Some(cfg.default_enrollment_status.clone());
	}

	filter.paging = Some(bounded_paging(cfg, filter.paging));

	Ok(filter)
}

/// Validates a draft filter; the group side gets enrolled-only targeting and the draft
/// itself gets bounded paging.
pub fn prepare_draft(
	cfg: &herald_config::Audience,
	mut filter: DraftAudienceFilter,
) -> Result<DraftAudienceFilter> {
	filter.validate()?;

	if let Some(group) = filter.group.as_mut()
		&& cfg.enrolled_only
		&& group.enrollment_status.is_none()
	{
		group.enrollment_status = Some(cfg.default_enrollment_status.clone());
	}

	filter.paging = Some(bounded_paging(cfg, filter.paging));

	Ok(filter)
}

/// Validates a send filter and applies enrolled-only targeting to the target group and to
/// directly named recipients.
pub fn prepare_send(
	cfg: &herald_config::Audience,
	mut filter: SendAudienceFilter,
) -> Result<SendAudienceFilter> {
	filter.validate()?;

	if cfg.enrolled_only {
		if filter.target.enrollment_status.is_none() {
			filter.target.enrollment_status = Some(cfg.default_enrollment_status.clone());
		}
		if filter.enrollment_statuses == Selector::Unconstrained {
			filter.enrollment_statuses = Selector::list([cfg.default_enrollment_status.as_str()]);
		}
	}

	Ok(filter)
}

/// Pages are always ordered by name so consecutive pages neither overlap nor skip rows.
pub fn paged_options(options: FetchOptions) -> FetchOptions {
	match options.order_by_name {
		OrderByName::Default => FetchOptions { order_by_name: OrderByName::Ascending, ..options },
		_ => options,
	}
}

fn bounded_paging(cfg: &herald_config::Audience, paging: Option<Paging>) -> Paging {
	let paging = paging.unwrap_or(Paging::new(cfg.default_page_limit, 0));

	if paging.limit > cfg.max_page_limit {
		tracing::warn!(
			requested = paging.limit,
			max = cfg.max_page_limit,
			"Clamping audience page limit."
		);
	}

	paging.clamped(cfg.max_page_limit)
}
