//! API path templates and the endpoint families built from them.
//!
//! A template is a path plus fixed query pairs, both of which may reference the
//! `{organization_id}` and `{machine_id}` placeholders. The textual form accepted by settings
//! files is `/path/{machine_id}?key=value&other={organization_id}`.

// self
use crate::{
	_prelude::*,
	auth::{MachineId, OrganizationId},
	error::ConfigError,
};

const ORGANIZATION_PLACEHOLDER: &str = "organization_id";
const MACHINE_PLACEHOLDER: &str = "machine_id";

/// Values substituted into template placeholders.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateVars<'a> {
	/// Value for `{organization_id}`.
	pub organization_id: Option<&'a OrganizationId>,
	/// Value for `{machine_id}`.
	pub machine_id: Option<&'a MachineId>,
}
impl<'a> TemplateVars<'a> {
	/// Variables for organization-scoped endpoints.
	pub fn organization(id: &'a OrganizationId) -> Self {
		Self { organization_id: Some(id), machine_id: None }
	}

	/// Variables for machine-scoped endpoints.
	pub fn machine(id: &'a MachineId) -> Self {
		Self { organization_id: None, machine_id: Some(id) }
	}

	fn lookup(&self, name: &str) -> Option<&'a str> {
		match name {
			ORGANIZATION_PLACEHOLDER => self.organization_id.map(|id| id.as_ref()),
			MACHINE_PLACEHOLDER => self.machine_id.map(|id| id.as_ref()),
			_ => None,
		}
	}
}

/// One upstream endpoint: a path template plus fixed query pairs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EndpointTemplate {
	path: String,
	query: Vec<(String, String)>,
}
impl EndpointTemplate {
	/// Creates a template after validating the path and its placeholders.
	pub fn new(path: impl Into<String>) -> Result<Self, ConfigError> {
		let template = Self { path: path.into(), query: Vec::new() };

		template.validate()?;

		Ok(template)
	}

	/// Appends a fixed query pair; the value may contain placeholders.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Path portion of the template.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Fixed query pairs of the template.
	pub fn query(&self) -> &[(String, String)] {
		&self.query
	}

	/// Substitutes `vars` and joins the result onto `base`.
	pub fn render(&self, base: &Url, vars: &TemplateVars) -> Result<Url, ConfigError> {
		let lookup = |name: &str| vars.lookup(name);
		let path = expand(&self.path, lookup).map_err(|reason| self.invalid(reason))?;
		let mut url = join_base(base, &path)?;

		if !self.query.is_empty() {
			let mut pairs = url.query_pairs_mut();

			for (key, value) in &self.query {
				let value = expand(value, lookup).map_err(|reason| self.invalid(reason))?;

				pairs.append_pair(key, &value);
			}
		}

		Ok(url)
	}

	/// Checks the path shape and that every placeholder is known.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !self.path.starts_with('/') {
			return Err(self.invalid("path must start with `/`"));
		}
		if self.path.contains(['?', '#']) {
			return Err(self.invalid("path must not carry a query or fragment"));
		}

		let known = |name: &str| {
			matches!(name, ORGANIZATION_PLACEHOLDER | MACHINE_PLACEHOLDER).then_some("")
		};

		expand(&self.path, known).map_err(|reason| self.invalid(reason))?;

		for (key, value) in &self.query {
			if key.is_empty() {
				return Err(self.invalid("query keys cannot be empty"));
			}

			expand(value, known).map_err(|reason| self.invalid(reason))?;
		}

		Ok(())
	}

	fn fixed(path: &str, query: &[(&str, &str)]) -> Self {
		Self {
			path: path.to_owned(),
			query: query.iter().map(|(key, value)| ((*key).to_owned(), (*value).to_owned())).collect(),
		}
	}

	fn invalid(&self, reason: &'static str) -> ConfigError {
		ConfigError::InvalidPathTemplate { template: self.to_string(), reason }
	}
}
impl Debug for EndpointTemplate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "EndpointTemplate({self})")
	}
}
impl Display for EndpointTemplate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.path)?;

		for (idx, (key, value)) in self.query.iter().enumerate() {
			f.write_str(if idx == 0 { "?" } else { "&" })?;
			write!(f, "{key}={value}")?;
		}

		Ok(())
	}
}
impl FromStr for EndpointTemplate {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (path, query) = s.split_once('?').unwrap_or((s, ""));
		let mut template = Self { path: path.to_owned(), query: Vec::new() };

		for pair in query.split('&').filter(|pair| !pair.is_empty()) {
			let (key, value) = pair.split_once('=').unwrap_or((pair, ""));

			template = template.with_query(key, value);
		}

		template.validate()?;

		Ok(template)
	}
}
impl TryFrom<String> for EndpointTemplate {
	type Error = ConfigError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl From<EndpointTemplate> for String {
	fn from(value: EndpointTemplate) -> Self {
		value.to_string()
	}
}

/// Path templates for every resource family the upstream client reads.
///
/// Dual-endpoint families are ordered lists: the first template is the primary endpoint and
/// the rest are fallbacks, tried in order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiPaths {
	/// Organizations visible to the token.
	pub organizations: EndpointTemplate,
	/// Machines of one organization (primary first).
	pub machines: Vec<EndpointTemplate>,
	/// Single machine detail.
	pub machine: EndpointTemplate,
	/// Machine location (primary first).
	pub machine_location: Vec<EndpointTemplate>,
	/// Alerts raised by one machine.
	pub machine_alerts: EndpointTemplate,
	/// Engine-hour readings of one machine.
	pub machine_engine_hours: EndpointTemplate,
}
impl ApiPaths {
	/// Validates every template and rejects empty fallback chains.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.machines.is_empty() {
			return Err(ConfigError::EmptyFallbackChain { family: "machines" });
		}
		if self.machine_location.is_empty() {
			return Err(ConfigError::EmptyFallbackChain { family: "machine location" });
		}

		[&self.organizations, &self.machine, &self.machine_alerts, &self.machine_engine_hours]
			.into_iter()
			.chain(&self.machines)
			.chain(&self.machine_location)
			.try_for_each(EndpointTemplate::validate)
	}
}
impl Default for ApiPaths {
	fn default() -> Self {
		Self {
			organizations: EndpointTemplate::fixed("/platform/organizations", &[]),
			machines: vec![
				EndpointTemplate::fixed(
					"/platform/equipment",
					&[("organizationId", "{organization_id}"), ("categories", "machine")],
				),
				EndpointTemplate::fixed("/isg/equipment", &[("organizationIds", "{organization_id}")]),
			],
			machine: EndpointTemplate::fixed("/platform/machines/{machine_id}", &[]),
			machine_location: vec![
				EndpointTemplate::fixed("/platform/machines/{machine_id}/locationHistory", &[]),
				EndpointTemplate::fixed("/platform/machines/{machine_id}/location", &[]),
			],
			machine_alerts: EndpointTemplate::fixed("/platform/machines/{machine_id}/alerts", &[]),
			machine_engine_hours: EndpointTemplate::fixed(
				"/platform/machines/{machine_id}/engineHours",
				&[],
			),
		}
	}
}

/// Joins `path` onto `base`, keeping any path prefix the base already carries.
pub(crate) fn join_base(base: &Url, path: &str) -> Result<Url, ConfigError> {
	let root = base.as_str().trim_end_matches('/');
	let path = path.trim_start_matches('/');

	Url::parse(&format!("{root}/{path}"))
		.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "api", source })
}

fn expand<'v>(
	text: &str,
	lookup: impl Fn(&str) -> Option<&'v str>,
) -> Result<String, &'static str> {
	let mut out = String::with_capacity(text.len());
	let mut rest = text;

	while let Some(open) = rest.find('{') {
		let (head, tail) = rest.split_at(open);
		let close = tail.find('}').ok_or("unterminated placeholder")?;
		let name = &tail[1..close];

		if head.contains('}') {
			return Err("unbalanced placeholder braces");
		}

		out.push_str(head);
		out.push_str(lookup(name).ok_or("placeholder is unknown or has no value")?);

		rest = &tail[close + 1..];
	}

	if rest.contains('}') {
		return Err("unbalanced placeholder braces");
	}

	out.push_str(rest);

	Ok(out)
}
