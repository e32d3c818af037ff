use super::Tool;
use super::toolset::ToolCallError;

use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use schemars::schema::{Schema, SchemaObject};
use serde::de::Deserialize;
use serde_json::Error as JsonError;
use serde_json::Value;
use thiserror::Error;

type ToolTraitObject = Box<dyn Tool + Send + Sync>;
type Deserializer = Box<dyn Fn(&str) -> Result<ToolTraitObject, JsonError> + Send + Sync>;

/// A registered tool: what gets advertised to the model plus the decoder
/// that turns call arguments back into a runnable `Tool`.
pub struct ToolObject {
    pub json_schema: Value,
    pub description: String,
    pub name: String,
    deserializer: Deserializer,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing metadata")]
    MissingMetadata,
    #[error("could not convert to json")]
    JsonSerialization(JsonError),
}

impl ToolObject {
    pub fn try_from_tool<T>() -> Result<Self, ValidationError>
    where
        T: JsonSchema + Tool + Send + Sync + for<'de> Deserialize<'de> + 'static,
    {
        let schema = SchemaSettings::draft07()
            .with(|settings| {
                settings.inline_subschemas = true;
                settings.meta_schema = None;
            })
            .into_generator()
            .into_root_schema_for::<T>();

        let (name, description) = validate_tool_schema(&schema.schema)?;

        let mut json_schema =
            serde_json::to_value(&schema).map_err(ValidationError::JsonSerialization)?;
        // name and description travel in the function declaration itself
        if let Some(object) = json_schema.as_object_mut() {
            object.remove("title");
            object.remove("description");
            object.remove("definitions");
        }

        let deserializer = Box::new(|data: &str| {
            serde_json::from_str::<T>(data).map(|tool| Box::new(tool) as ToolTraitObject)
        });

        Ok(Self {
            name,
            json_schema,
            description,
            deserializer,
        })
    }

    pub fn try_deserialize(&self, data: &str) -> Result<ToolTraitObject, JsonError> {
        let deserializer = &self.deserializer;
        deserializer(data)
    }

    /// Decode `json` into this tool's input and run it.
    pub fn call(&self, json: &str) -> Result<String, ToolCallError> {
        let tool = self
            .try_deserialize(json)
            .map_err(ToolCallError::Deserialization)?;
        tool.apply().map_err(ToolCallError::Execution)
    }
}

impl From<&ToolObject> for ChatCompletionTool {
    fn from(value: &ToolObject) -> Self {
        Self {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: value.name.clone(),
                description: Some(value.description.clone()),
                parameters: Some(value.json_schema.clone()),
                strict: None,
            },
        }
    }
}

fn validate_tool_schema(schema: &SchemaObject) -> Result<(String, String), ValidationError> {
    let name = schema
        .metadata
        .as_deref()
        .ok_or(ValidationError::MissingMetadata)?
        .title
        .as_deref()
        .ok_or(ValidationError::MissingMetadata)?
        .to_string();

    let description = validate_tool_description(schema)?;
    Ok((name, description))
}

// every property needs a description, the model has nothing else to go on
fn validate_tool_description(schema: &SchemaObject) -> Result<String, ValidationError> {
    let description = schema
        .metadata
        .as_deref()
        .ok_or(ValidationError::MissingMetadata)?
        .description
        .as_deref()
        .ok_or(ValidationError::MissingMetadata)?;

    if let Some(object) = schema.object.as_deref() {
        for sub_schema in object.properties.values() {
            if let Schema::Object(sub_schema_object) = sub_schema {
                validate_tool_description(sub_schema_object)?;
            }
        }
    }

    Ok(description.to_string())
}
