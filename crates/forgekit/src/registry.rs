//! Resource registry.
//!
//! Resources and operations are closed enums with stable wire names. Each
//! resource contributes one [`ResourceBundle`]; the registry collects them in
//! registration order and answers handler lookups by exact pair.

use std::collections::BTreeMap;
use std::str::FromStr;

use futures::future::BoxFuture;

use crate::client::ForgeClient;
use crate::error::{ForgeError, Result};
use crate::fields::{Property, PropertyOption, title_case};
use crate::load_options::{ListSearchFn, LoadOptionsFn};
use crate::params::ItemParameters;
use crate::record::OutputRecord;

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable wire name.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Human-readable label, e.g. "Pull Request".
            #[must_use]
            pub fn display_name(self) -> String {
                title_case(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ForgeError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ForgeError::parameter($kind, format!("unknown value '{other}'"))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum!(
    /// Forge resource kinds.
    Resource, "resource" {
        Repository => "repository",
        Issue => "issue",
        PullRequest => "pullRequest",
        Organization => "organization",
        User => "user",
        Comment => "comment",
        Label => "label",
        Milestone => "milestone",
        Release => "release",
        Branch => "branch",
        File => "file",
    }
);

wire_enum!(
    /// Operations a resource may support.
    Operation, "operation" {
        Create => "create",
        Get => "get",
        Update => "update",
        Delete => "delete",
        List => "list",
        Search => "search",
        Fork => "fork",
        Merge => "merge",
        ListMembers => "listMembers",
        GetByUsername => "getByUsername",
    }
);

/// Everything a handler may read for one item.
#[derive(Debug, Clone, Copy)]
pub struct ItemContext<'a> {
    pub client: &'a ForgeClient,
    pub params: &'a ItemParameters,
    pub index: usize,
}

pub type HandlerFuture<'a> = BoxFuture<'a, Result<Vec<OutputRecord>>>;

/// An operation handler. Stateless; reads everything from the context.
pub type HandlerFn = for<'a> fn(ItemContext<'a>) -> HandlerFuture<'a>;

/// One resource's metadata, handlers and option providers.
pub struct ResourceBundle {
    pub resource: Resource,
    pub operations: Vec<Property>,
    pub fields: Vec<Property>,
    pub handlers: Vec<(Operation, HandlerFn)>,
    pub load_options: Vec<(&'static str, LoadOptionsFn)>,
    pub list_search: Vec<(&'static str, ListSearchFn)>,
}

impl ResourceBundle {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            operations: Vec::new(),
            fields: Vec::new(),
            handlers: Vec::new(),
            load_options: Vec::new(),
            list_search: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_operations(mut self, selector: Property) -> Self {
        self.operations.push(selector);
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Property>) -> Self {
        self.fields.extend(fields);
        self
    }

    #[must_use]
    pub fn with_handler(mut self, operation: Operation, handler: HandlerFn) -> Self {
        self.handlers.push((operation, handler));
        self
    }

    #[must_use]
    pub fn with_load_options(mut self, name: &'static str, provider: LoadOptionsFn) -> Self {
        self.load_options.push((name, provider));
        self
    }

    #[must_use]
    pub fn with_list_search(mut self, name: &'static str, provider: ListSearchFn) -> Self {
        self.list_search.push((name, provider));
        self
    }

    /// Operations this bundle has handlers for, in declaration order.
    pub fn supported_operations(&self) -> impl Iterator<Item = Operation> + '_ {
        self.handlers.iter().map(|(operation, _)| *operation)
    }
}

impl std::fmt::Debug for ResourceBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceBundle")
            .field("resource", &self.resource)
            .field("operations", &self.supported_operations().collect::<Vec<_>>())
            .field("fields", &self.fields.len())
            .finish_non_exhaustive()
    }
}

/// Registered bundles, in registration order.
#[derive(Default)]
pub struct ResourceRegistry {
    bundles: Vec<ResourceBundle>,
    load_options: BTreeMap<&'static str, LoadOptionsFn>,
    list_search: BTreeMap<&'static str, ListSearchFn>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bundle.
    ///
    /// Fails if the resource is already registered, if the bundle declares
    /// the same operation twice, or if one of its provider names is taken.
    /// A failed registration leaves the registry unchanged.
    pub fn register(&mut self, bundle: ResourceBundle) -> Result<()> {
        if self.bundles.iter().any(|b| b.resource == bundle.resource) {
            return Err(ForgeError::DuplicateResource(bundle.resource.to_string()));
        }

        for (i, (operation, _)) in bundle.handlers.iter().enumerate() {
            if bundle.handlers[..i].iter().any(|(seen, _)| seen == operation) {
                return Err(ForgeError::DuplicateMethod(format!(
                    "{}.{}",
                    bundle.resource, operation
                )));
            }
        }

        let mut load_names: Vec<&str> = Vec::new();
        for (name, _) in &bundle.load_options {
            if self.load_options.contains_key(name) || load_names.contains(name) {
                return Err(ForgeError::DuplicateMethod((*name).to_string()));
            }
            load_names.push(name);
        }
        let mut search_names: Vec<&str> = Vec::new();
        for (name, _) in &bundle.list_search {
            if self.list_search.contains_key(name) || search_names.contains(name) {
                return Err(ForgeError::DuplicateMethod((*name).to_string()));
            }
            search_names.push(name);
        }

        self.load_options.extend(bundle.load_options.iter().copied());
        self.list_search.extend(bundle.list_search.iter().copied());
        self.bundles.push(bundle);
        Ok(())
    }

    pub fn bundle(&self, resource: Resource) -> Option<&ResourceBundle> {
        self.bundles.iter().find(|b| b.resource == resource)
    }

    pub fn bundles(&self) -> &[ResourceBundle] {
        &self.bundles
    }

    pub fn get_handler(&self, resource: Resource, operation: Operation) -> Option<HandlerFn> {
        self.bundle(resource)?
            .handlers
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|(_, handler)| *handler)
    }

    /// Look up by wire names; unknown names simply find nothing.
    pub fn find_handler(&self, resource: &str, operation: &str) -> Option<HandlerFn> {
        let resource = resource.parse().ok()?;
        let operation = operation.parse().ok()?;
        self.get_handler(resource, operation)
    }

    /// Every bundle's operation selector followed by its fields.
    pub fn all_properties(&self) -> Vec<Property> {
        self.bundles
            .iter()
            .flat_map(|b| b.operations.iter().chain(b.fields.iter()).cloned())
            .collect()
    }

    /// The top-level resource selector; defaults to the first registered
    /// resource.
    pub fn resource_selector(&self) -> Property {
        let options: Vec<PropertyOption> = self
            .bundles
            .iter()
            .map(|b| PropertyOption::new(b.resource.display_name(), b.resource.as_str()))
            .collect();
        let default = self
            .bundles
            .first()
            .map(|b| b.resource.as_str())
            .unwrap_or_default();

        Property {
            no_data_expression: true,
            options,
            ..Property::options("resource", "Resource", &[], default)
        }
    }

    pub fn all_load_options(&self) -> &BTreeMap<&'static str, LoadOptionsFn> {
        &self.load_options
    }

    pub fn all_list_search(&self) -> &BTreeMap<&'static str, ListSearchFn> {
        &self.list_search
    }

    pub fn resource_names(&self) -> Vec<&'static str> {
        self.bundles.iter().map(|b| b.resource.as_str()).collect()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("resources", &self.resource_names())
            .field("load_options", &self.load_options.keys().collect::<Vec<_>>())
            .field("list_search", &self.list_search.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_options::{OptionEntry, get_branches};
    use serde_json::json;

    fn ok_handler(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
        Box::pin(async move { Ok(vec![OutputRecord::from_value(json!({ "index": ctx.index }))]) })
    }

    fn other_provider<'a>(
        _client: &'a ForgeClient,
        _params: &'a ItemParameters,
    ) -> BoxFuture<'a, Result<Vec<OptionEntry>>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn bundle(resource: Resource, operations: &[Operation]) -> ResourceBundle {
        operations
            .iter()
            .fold(ResourceBundle::new(resource), |bundle, op| {
                bundle.with_handler(*op, ok_handler)
            })
    }

    #[test]
    fn test_wire_names_round_trip() {
        assert_eq!("pullRequest".parse::<Resource>().unwrap(), Resource::PullRequest);
        assert_eq!(Operation::ListMembers.as_str(), "listMembers");
        assert_eq!(Resource::PullRequest.display_name(), "Pull Request");
        assert!("pullrequest".parse::<Resource>().is_err());
        assert_eq!(Resource::ALL.len(), 11);
    }

    #[test]
    fn test_lookup_by_exact_pair() {
        let mut registry = ResourceRegistry::new();
        registry
            .register(bundle(Resource::Branch, &[Operation::Create, Operation::List]))
            .expect("register");

        assert!(registry.get_handler(Resource::Branch, Operation::Create).is_some());
        assert!(registry.get_handler(Resource::Branch, Operation::Update).is_none());
        assert!(registry.get_handler(Resource::File, Operation::Create).is_none());
        assert!(registry.find_handler("branch", "list").is_some());
        assert!(registry.find_handler("branch", "merge").is_none());
        assert!(registry.find_handler("nope", "list").is_none());
    }

    #[test]
    fn test_duplicate_resource_fails_loudly() {
        let mut registry = ResourceRegistry::new();
        registry
            .register(bundle(Resource::Label, &[Operation::Get]))
            .expect("first");
        let err = registry
            .register(bundle(Resource::Label, &[Operation::List]))
            .expect_err("duplicate");
        assert!(matches!(err, ForgeError::DuplicateResource(ref r) if r == "label"));
        // The original bundle survives.
        assert!(registry.get_handler(Resource::Label, Operation::Get).is_some());
        assert!(registry.get_handler(Resource::Label, Operation::List).is_none());
    }

    #[test]
    fn test_duplicate_operation_in_bundle_fails() {
        let mut registry = ResourceRegistry::new();
        let err = registry
            .register(bundle(Resource::Label, &[Operation::Get, Operation::Get]))
            .expect_err("duplicate operation");
        assert!(matches!(err, ForgeError::DuplicateMethod(ref m) if m == "label.get"));
        assert!(registry.resource_names().is_empty());
    }

    #[test]
    fn test_duplicate_provider_name_fails() {
        let mut registry = ResourceRegistry::new();
        let first = bundle(Resource::Branch, &[]).with_load_options("getBranches", get_branches);
        registry.register(first).expect("first");

        let second = bundle(Resource::File, &[]).with_load_options("getBranches", other_provider);
        let err = registry.register(second).expect_err("duplicate provider");
        assert!(matches!(err, ForgeError::DuplicateMethod(ref m) if m == "getBranches"));
        assert_eq!(registry.resource_names(), vec!["branch"]);
        assert_eq!(registry.all_load_options().len(), 1);
    }

    #[test]
    fn test_resource_selector_follows_registration_order() {
        let mut registry = ResourceRegistry::new();
        for resource in [Resource::Issue, Resource::PullRequest, Resource::File] {
            registry.register(bundle(resource, &[])).expect("register");
        }

        let selector = registry.resource_selector();
        assert_eq!(selector.name, "resource");
        assert_eq!(selector.default, json!("issue"));
        let labels: Vec<&str> = selector.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(labels, vec!["Issue", "Pull Request", "File"]);
        assert_eq!(registry.resource_names(), vec!["issue", "pullRequest", "file"]);
    }

    #[test]
    fn test_empty_registry_selector_defaults_to_empty_string() {
        let selector = ResourceRegistry::new().resource_selector();
        assert_eq!(selector.default, json!(""));
        assert!(selector.options.is_empty());
    }

    #[test]
    fn test_all_properties_concatenates_in_order() {
        let mut registry = ResourceRegistry::new();
        let a = bundle(Resource::User, &[])
            .with_operations(Property::string("operation", "Operation"))
            .with_fields([Property::string("username", "Username")]);
        let b = bundle(Resource::Branch, &[])
            .with_fields([Property::string("branchName", "Branch Name")]);
        registry.register(a).expect("a");
        registry.register(b).expect("b");

        let names: Vec<String> = registry
            .all_properties()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["operation", "username", "branchName"]);
    }
}
