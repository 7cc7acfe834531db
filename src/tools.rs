use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use crate::model::FunctionCall;

pub const WEATHER_FUNCTION_NAME: &str = "get_current_weather";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

impl PropertySchema {
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            kind: "string".to_string(),
            description: Some(description.into()),
            allowed: None,
        }
    }

    pub fn string_enum(values: &[&str]) -> Self {
        Self {
            kind: "string".to_string(),
            description: None,
            allowed: Some(values.iter().map(|value| (*value).to_string()).collect()),
        }
    }
}

/// JSON-schema object describing a function's parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: BTreeMap<String, PropertySchema>,
    pub required: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    message: String,
}

impl SchemaError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid function schema: {}", self.message)
    }
}

impl Error for SchemaError {}

impl FunctionDefinition {
    pub fn validate(&self) -> std::result::Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::new("function name is empty"));
        }
        if self.parameters.kind != "object" {
            return Err(SchemaError::new(format!(
                "'{}' parameters must be an object, got '{}'",
                self.name, self.parameters.kind
            )));
        }
        for (prop_name, prop) in &self.parameters.properties {
            if prop_name.trim().is_empty() {
                return Err(SchemaError::new(format!(
                    "'{}' has a property with an empty name",
                    self.name
                )));
            }
            if prop.allowed.as_ref().is_some_and(Vec::is_empty) {
                return Err(SchemaError::new(format!(
                    "property '{}' declares an empty enum",
                    prop_name
                )));
            }
        }
        if let Some(missing) = self
            .parameters
            .required
            .iter()
            .find(|name| !self.parameters.properties.contains_key(*name))
        {
            return Err(SchemaError::new(format!(
                "required property '{}' is not declared",
                missing
            )));
        }
        Ok(())
    }
}

pub fn weather_function() -> FunctionDefinition {
    let mut properties = BTreeMap::new();
    properties.insert(
        "location".to_string(),
        PropertySchema::string("The city and country, e.g. London, UK"),
    );
    properties.insert(
        "unit".to_string(),
        PropertySchema::string_enum(&["celsius", "fahrenheit"]),
    );

    FunctionDefinition {
        name: WEATHER_FUNCTION_NAME.to_string(),
        description: "Get the current weather in a given location".to_string(),
        parameters: ParameterSchema {
            kind: "object".to_string(),
            properties,
            required: vec!["location".to_string()],
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "celsius",
            Self::Fahrenheit => "fahrenheit",
        }
    }
}

/// Arguments the model supplies for `get_current_weather`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WeatherQuery {
    pub location: String,
    #[serde(default)]
    pub unit: Option<TemperatureUnit>,
}

pub fn parse_arguments<T: DeserializeOwned>(call: &FunctionCall) -> Result<T> {
    serde_json::from_str(&call.arguments).with_context(|| {
        format!(
            "Failed to decode arguments for function '{}': {}",
            call.name, call.arguments
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{TemperatureUnit, WeatherQuery, parse_arguments, weather_function};
    use crate::model::FunctionCall;

    fn call(arguments: &str) -> FunctionCall {
        FunctionCall {
            name: "get_current_weather".to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn weather_function_schema_is_valid() {
        assert!(weather_function().validate().is_ok());
    }

    #[test]
    fn weather_function_serializes_as_json_schema() {
        let value = serde_json::to_value(weather_function()).expect("schema should serialize");
        assert_eq!(value["name"], "get_current_weather");
        assert_eq!(value["parameters"]["type"], "object");
        assert_eq!(value["parameters"]["required"][0], "location");
        assert_eq!(
            value["parameters"]["properties"]["location"]["type"],
            "string"
        );
        assert_eq!(
            value["parameters"]["properties"]["unit"]["enum"][1],
            "fahrenheit"
        );
        assert!(
            value["parameters"]["properties"]["unit"]
                .get("description")
                .is_none()
        );
    }

    #[test]
    fn validate_rejects_undeclared_required_property() {
        let mut def = weather_function();
        def.parameters.required.push("country".to_string());
        let err = def.validate().expect_err("schema should be rejected");
        assert!(err.to_string().contains("country"));
    }

    #[test]
    fn validate_rejects_empty_enum_and_empty_name() {
        let mut def = weather_function();
        if let Some(unit) = def.parameters.properties.get_mut("unit") {
            unit.allowed = Some(Vec::new());
        }
        assert!(def.validate().is_err());

        let mut def = weather_function();
        def.name = " ".to_string();
        assert!(def.validate().is_err());
    }

    #[test]
    fn parse_arguments_decodes_weather_query() {
        let query: WeatherQuery =
            parse_arguments(&call(r#"{"location":"London, UK","unit":"celsius"}"#))
                .expect("arguments should parse");
        assert_eq!(query.location, "London, UK");
        assert_eq!(query.unit, Some(TemperatureUnit::Celsius));
        assert_eq!(query.unit.map(|unit| unit.as_str()), Some("celsius"));
    }

    #[test]
    fn parse_arguments_allows_missing_unit() {
        let query: WeatherQuery =
            parse_arguments(&call(r#"{"location":"Oslo, NO"}"#)).expect("arguments should parse");
        assert_eq!(query.location, "Oslo, NO");
        assert!(query.unit.is_none());
    }

    #[test]
    fn parse_arguments_rejects_truncated_json() {
        let err = parse_arguments::<WeatherQuery>(&call(r#"{"location":"London, UK","un"#))
            .expect_err("truncated payload should fail");
        let msg = format!("{err:#}");
        assert!(
            msg.contains("Failed to decode arguments for function 'get_current_weather'"),
            "unexpected message: {msg}"
        );
    }

    #[test]
    fn parse_arguments_rejects_unknown_unit() {
        assert!(
            parse_arguments::<WeatherQuery>(&call(r#"{"location":"Paris","unit":"kelvin"}"#))
                .is_err()
        );
    }
}
