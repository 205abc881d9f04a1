/// JSON value to a YAML document string.
pub fn json_to_yaml(json: &serde_json::Value) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(json)
}

/// YAML document string to a JSON value.
pub fn yaml_to_json(yaml: &str) -> Result<serde_json::Value, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn simple_object_to_yaml() {
        assert_eq!(json_to_yaml(&json!({"key": "value"})).unwrap(), "key: value\n");
    }

    #[test]
    fn nested_structures_round_trip() {
        let value = json!({
            "name": "utilbelt",
            "ports": [5000, 3000],
            "nested": {"enabled": true, "ratio": 0.5}
        });
        let yaml = json_to_yaml(&value).unwrap();
        assert_eq!(yaml_to_json(&yaml).unwrap(), value);
    }

    #[test]
    fn yaml_scalars_become_typed_json() {
        let json = yaml_to_json("count: 3\nenabled: true\nname: x\n").unwrap();
        assert_eq!(json["count"], 3);
        assert_eq!(json["enabled"], true);
        assert_eq!(json["name"], "x");
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(yaml_to_json("key: [unclosed").is_err());
    }
}
