use crate::compiler::{AudiencePlan, union::UnionQuery};

/// One named side of a query that combines several audience sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
	Group,
	Individual,
	/// Directly named students and their parents.
	Receiver,
}
impl Layer {
	fn cte(&self) -> &'static str {
		match self {
			Self::Group => "group_audiences",
			Self::Individual => "individual_audiences",
			Self::Receiver => "receiver_audiences",
		}
	}

	fn alias(&self) -> &'static str {
		match self {
			Self::Group => "ga",
			Self::Individual => "ia",
			Self::Receiver => "ra",
		}
	}
}

/// Combines the group and individual sides of a draft.
///
/// Empty sides drop out, a lone side passes through unchanged, and both sides become a
/// `WITH` query.
pub fn combine_draft(group: Option<UnionQuery>, individual: Option<UnionQuery>) -> AudiencePlan {
	combine_layers([(Layer::Group, group), (Layer::Individual, individual)])
}

/// Combines layers listed in precedence order. Absent and empty layers drop out; a lone
/// layer passes through as a plain union.
pub fn combine_layers<const N: usize>(layers: [(Layer, Option<UnionQuery>); N]) -> AudiencePlan {
	let mut layers = layers
		.into_iter()
		.filter_map(|(layer, query)| Some((layer, query?)))
		.filter(|(_, query)| !query.is_empty())
		.collect::<Vec<_>>();

	if layers.len() > 1 {
		return AudiencePlan::Layered(layers);
	}

	match layers.pop() {
		Some((_, query)) => AudiencePlan::Union(query),
		None => AudiencePlan::Empty,
	}
}

/// A recipient matched by an earlier layer is reported once, as that layer's recipient.
pub fn render_layers(layers: &[(Layer, UnionQuery)]) -> String {
	let ctes = layers
		.iter()
		.map(|(layer, query)| format!("{} AS (\n{}\n)", layer.cte(), query.render()))
		.collect::<Vec<_>>()
		.join(",\n");
	let selects = layers
		.iter()
		.enumerate()
		.map(|(idx, (layer, _))| render_layer_select(*layer, &layers[..idx]))
		.collect::<Vec<_>>()
		.join("\nUNION\n");

	format!("WITH {ctes}\n{selects}")
}

fn render_layer_select(layer: Layer, earlier: &[(Layer, UnionQuery)]) -> String {
	if earlier.is_empty() {
		return format!("SELECT * FROM {}", layer.cte());
	}

	let alias = layer.alias();
	let mut sql = format!("SELECT {alias}.* FROM {} {alias}", layer.cte());
	let mut misses = Vec::with_capacity(earlier.len());

	for (prior, _) in earlier {
		let prior_alias = prior.alias();

		sql.push_str(&format!(
			"\nLEFT JOIN {} {prior_alias} ON {prior_alias}.user_id = {alias}.user_id",
			prior.cte()
		));
		misses.push(format!("{prior_alias}.user_id IS NULL"));
	}

	sql.push_str(&format!("\nWHERE {}", misses.join(" AND ")));

	sql
}
