use forgekit::{Property, ResourceBundle, ResourceRegistry, default_registry};
use serde::Serialize;

use crate::commands::shared::{OutputFormat, print_json};

/// One registered resource, for display.
#[derive(Debug, Clone, Serialize, tabled::Tabled)]
pub(crate) struct ResourceRow {
    #[tabled(rename = "Resource")]
    pub resource: String,
    #[tabled(rename = "Operations")]
    pub operations: String,
    #[tabled(rename = "Fields")]
    pub fields: usize,
    #[tabled(rename = "Providers")]
    pub providers: String,
}

impl From<&ResourceBundle> for ResourceRow {
    fn from(bundle: &ResourceBundle) -> Self {
        let operations: Vec<&str> = bundle.supported_operations().map(|op| op.as_str()).collect();
        let providers: Vec<&str> = bundle
            .load_options
            .iter()
            .map(|(name, _)| *name)
            .chain(bundle.list_search.iter().map(|(name, _)| *name))
            .collect();

        Self {
            resource: bundle.resource.as_str().to_string(),
            operations: operations.join(", "),
            fields: bundle.fields.len(),
            providers: if providers.is_empty() {
                "-".to_string()
            } else {
                providers.join(", ")
            },
        }
    }
}

/// Full registry metadata as emitted by `describe --output json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegistryDescription {
    pub resource: Property,
    pub properties: Vec<Property>,
    pub load_options: Vec<&'static str>,
    pub list_search: Vec<&'static str>,
}

impl From<&ResourceRegistry> for RegistryDescription {
    fn from(registry: &ResourceRegistry) -> Self {
        Self {
            resource: registry.resource_selector(),
            properties: registry.all_properties(),
            load_options: registry.all_load_options().keys().copied().collect(),
            list_search: registry.all_list_search().keys().copied().collect(),
        }
    }
}

pub(crate) fn handle_describe(output: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let registry = default_registry()?;

    match output {
        OutputFormat::Table => {
            let rows: Vec<ResourceRow> = registry.bundles().iter().map(ResourceRow::from).collect();
            let mut table = tabled::Table::new(rows);
            table.with(tabled::settings::Style::rounded());
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&RegistryDescription::from(&registry))?,
    }

    Ok(())
}
