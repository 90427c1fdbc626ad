//! Avro schema parsing and JSON <-> Avro binary conversion
//!
//! Registry schemas are parsed into an [`AvroType`], the compiled form used by
//! the wire codec. Values cross the API boundary as `serde_json::Value`:
//!
//! | Avro | JSON |
//! |------|------|
//! | null, boolean, int, long, float, double, string | native JSON |
//! | bytes, fixed, decimal | base64 string |
//! | uuid, big-decimal | string |
//! | timestamp, local-timestamp (any precision) | integer |
//! | duration | `{"months", "days", "millis"}` object |
//! | enum | symbol string |
//! | record, map | object |
//! | array | array |
//! | union | the branch value, or `{"<branch>": value}` in [`UnionMode::Wrapped`] |
//!
//! Every parse starts from an empty name table, so two registry schemas that
//! declare the same named type never collide with each other. A name defined
//! twice inside one schema is a parse error.

use crate::error::{CodecError, CodecResult};
use apache_avro::schema::{Name, RecordField, UnionSchema};
use apache_avro::{
    from_avro_datum, to_avro_datum, types::Value as AvroValue, BigDecimal, Days, Decimal,
    Duration, Millis, Months, Schema as AvroSchema, Uuid,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::io::Cursor;

/// How union values are represented in JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnionMode {
    /// Unions decode to the bare branch value; encoding accepts bare or
    /// wrapped values and picks the first matching branch.
    #[default]
    Auto,
    /// Non-null union values are always `{"<branch name>": value}`.
    Wrapped,
}

/// Options applied when compiling registry schemas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    #[serde(default)]
    pub union_mode: UnionMode,
}

impl ParserOptions {
    pub fn with_union_mode(mut self, mode: UnionMode) -> Self {
        self.union_mode = mode;
        self
    }
}

/// Compiles raw schema text from the registry into an [`AvroType`]
pub trait SchemaParser: Send + Sync {
    fn parse(&self, raw: &str) -> CodecResult<AvroType>;
}

/// Default parser backed by `apache-avro`
#[derive(Debug, Clone, Default)]
pub struct AvroParser {
    options: ParserOptions,
}

impl AvroParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }
}

impl SchemaParser for AvroParser {
    fn parse(&self, raw: &str) -> CodecResult<AvroType> {
        AvroType::parse_with(raw, self.options.clone())
    }
}

/// Outcome of writing a value into a caller-provided buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryWrite {
    /// The value was written; number of bytes used.
    Written(usize),
    /// The buffer was too small; at least this many more bytes are needed.
    Insufficient(usize),
}

impl BinaryWrite {
    /// Copy an already encoded datum to the start of `buf`, all or nothing.
    pub fn copy(datum: &[u8], buf: &mut [u8]) -> Self {
        if datum.len() > buf.len() {
            return BinaryWrite::Insufficient(datum.len() - buf.len());
        }
        buf[..datum.len()].copy_from_slice(datum);
        BinaryWrite::Written(datum.len())
    }
}

/// A compiled Avro schema
#[derive(Clone)]
pub struct AvroType {
    inner: AvroSchema,
    raw: String,
    named: HashMap<String, AvroSchema>,
    options: ParserOptions,
}

impl std::fmt::Debug for AvroType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvroType")
            .field("name", &self.name())
            .field("raw", &self.raw)
            .finish()
    }
}

impl AvroType {
    /// Parse an Avro schema with default options
    pub fn parse(raw: &str) -> CodecResult<Self> {
        Self::parse_with(raw, ParserOptions::default())
    }

    pub fn parse_with(raw: &str, options: ParserOptions) -> CodecResult<Self> {
        let inner = AvroSchema::parse_str(raw)?;
        let mut named = HashMap::new();
        collect_named(&inner, &mut named)?;
        Ok(Self {
            inner,
            raw: raw.to_string(),
            named,
            options,
        })
    }

    pub fn inner(&self) -> &AvroSchema {
        &self.inner
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn canonical_form(&self) -> String {
        self.inner.canonical_form()
    }

    /// Fully qualified name for named types (record, enum, fixed)
    pub fn name(&self) -> Option<String> {
        match &self.inner {
            AvroSchema::Record(r) => Some(r.name.fullname(None)),
            AvroSchema::Enum(e) => Some(e.name.fullname(None)),
            AvroSchema::Fixed(f) => Some(f.name.fullname(None)),
            _ => None,
        }
    }

    /// Encode a JSON value to Avro binary (no envelope)
    pub fn encode(&self, value: &JsonValue) -> CodecResult<Vec<u8>> {
        let avro = self.json_to_avro(value, &self.inner)?;
        to_avro_datum(&self.inner, avro).map_err(|e| CodecError::Serialization(e.to_string()))
    }

    /// Write the binary encoding of `value` to the start of `buf`.
    ///
    /// Never writes a partial value: when `buf` is too short nothing is
    /// written and the shortfall is reported instead.
    pub fn write_binary(&self, value: &JsonValue, buf: &mut [u8]) -> CodecResult<BinaryWrite> {
        let datum = self.encode(value)?;
        Ok(BinaryWrite::copy(&datum, buf))
    }

    /// Decode Avro binary written with this schema.
    ///
    /// With a `reader`, the datum is resolved into the reader's shape: fields
    /// missing from the writer take the reader's defaults.
    pub fn decode(&self, data: &[u8], reader: Option<&AvroType>) -> CodecResult<JsonValue> {
        let mut cursor = Cursor::new(data);
        let value = from_avro_datum(&self.inner, &mut cursor, reader.map(|r| &r.inner))
            .map_err(|e| CodecError::Deserialization(e.to_string()))?;
        let target = reader.unwrap_or(self);
        target.avro_to_json(&value, Some(&target.inner))
    }

    fn resolve<'a>(&'a self, schema: &'a AvroSchema) -> &'a AvroSchema {
        match schema {
            AvroSchema::Ref { name } => self.named.get(&name.fullname(None)).unwrap_or(schema),
            _ => schema,
        }
    }

    fn json_to_avro(&self, json: &JsonValue, schema: &AvroSchema) -> CodecResult<AvroValue> {
        match (self.resolve(schema), json) {
            (AvroSchema::Null, JsonValue::Null) => Ok(AvroValue::Null),

            (AvroSchema::Boolean, JsonValue::Bool(b)) => Ok(AvroValue::Boolean(*b)),

            (AvroSchema::Int, JsonValue::Number(n)) => Ok(AvroValue::Int(as_i32(n)?)),
            (AvroSchema::Date, JsonValue::Number(n)) => Ok(AvroValue::Date(as_i32(n)?)),
            (AvroSchema::TimeMillis, JsonValue::Number(n)) => {
                Ok(AvroValue::TimeMillis(as_i32(n)?))
            }

            (AvroSchema::Long, JsonValue::Number(n)) => Ok(AvroValue::Long(as_i64(n)?)),
            (AvroSchema::TimeMicros, JsonValue::Number(n)) => {
                Ok(AvroValue::TimeMicros(as_i64(n)?))
            }
            (AvroSchema::TimestampMillis, JsonValue::Number(n)) => {
                Ok(AvroValue::TimestampMillis(as_i64(n)?))
            }
            (AvroSchema::TimestampMicros, JsonValue::Number(n)) => {
                Ok(AvroValue::TimestampMicros(as_i64(n)?))
            }
            (AvroSchema::TimestampNanos, JsonValue::Number(n)) => {
                Ok(AvroValue::TimestampNanos(as_i64(n)?))
            }
            (AvroSchema::LocalTimestampMillis, JsonValue::Number(n)) => {
                Ok(AvroValue::LocalTimestampMillis(as_i64(n)?))
            }
            (AvroSchema::LocalTimestampMicros, JsonValue::Number(n)) => {
                Ok(AvroValue::LocalTimestampMicros(as_i64(n)?))
            }
            (AvroSchema::LocalTimestampNanos, JsonValue::Number(n)) => {
                Ok(AvroValue::LocalTimestampNanos(as_i64(n)?))
            }

            (AvroSchema::Float, JsonValue::Number(n)) => Ok(AvroValue::Float(as_f64(n)? as f32)),
            (AvroSchema::Double, JsonValue::Number(n)) => Ok(AvroValue::Double(as_f64(n)?)),

            (AvroSchema::String, JsonValue::String(s)) => Ok(AvroValue::String(s.clone())),

            (AvroSchema::Uuid, JsonValue::String(s)) => Uuid::parse_str(s)
                .map(AvroValue::Uuid)
                .map_err(|e| CodecError::InvalidValue(format!("Invalid uuid '{}': {}", s, e))),

            // two's-complement big-endian unscaled value, base64 encoded
            (AvroSchema::Decimal(decimal), JsonValue::String(s)) => {
                let bytes = decode_base64(s)?;
                if let AvroSchema::Fixed(fixed) = decimal.inner.as_ref() {
                    if bytes.len() > fixed.size {
                        return Err(CodecError::InvalidValue(format!(
                            "Decimal needs {} bytes, fixed size is {}",
                            bytes.len(),
                            fixed.size
                        )));
                    }
                }
                Ok(AvroValue::Decimal(Decimal::from(bytes)))
            }

            (AvroSchema::BigDecimal, JsonValue::String(s)) => s
                .parse::<BigDecimal>()
                .map(AvroValue::BigDecimal)
                .map_err(|e| CodecError::InvalidValue(format!("Invalid decimal '{}': {}", s, e))),

            (AvroSchema::Duration, JsonValue::Object(obj)) => {
                let part = |name: &str| -> CodecResult<u32> {
                    obj.get(name)
                        .and_then(JsonValue::as_u64)
                        .and_then(|v| u32::try_from(v).ok())
                        .ok_or_else(|| {
                            CodecError::InvalidValue(format!(
                                "Duration needs an unsigned 32-bit '{}'",
                                name
                            ))
                        })
                };
                Ok(AvroValue::Duration(Duration::new(
                    Months::new(part("months")?),
                    Days::new(part("days")?),
                    Millis::new(part("millis")?),
                )))
            }

            (AvroSchema::Bytes, JsonValue::String(s)) => Ok(AvroValue::Bytes(decode_base64(s)?)),

            (AvroSchema::Fixed(fixed), JsonValue::String(s)) => {
                let bytes = decode_base64(s)?;
                if bytes.len() != fixed.size {
                    return Err(CodecError::InvalidValue(format!(
                        "Fixed size mismatch: expected {}, got {}",
                        fixed.size,
                        bytes.len()
                    )));
                }
                Ok(AvroValue::Fixed(fixed.size, bytes))
            }

            (AvroSchema::Enum(enum_schema), JsonValue::String(s)) => enum_schema
                .symbols
                .iter()
                .position(|sym| sym == s)
                .map(|pos| AvroValue::Enum(pos as u32, s.clone()))
                .ok_or_else(|| CodecError::InvalidValue(format!("Invalid enum symbol: {}", s))),

            (AvroSchema::Array(array), JsonValue::Array(items)) => {
                let items = items
                    .iter()
                    .map(|item| self.json_to_avro(item, &array.items))
                    .collect::<CodecResult<Vec<_>>>()?;
                Ok(AvroValue::Array(items))
            }

            (AvroSchema::Map(map), JsonValue::Object(obj)) => {
                let mut out = HashMap::with_capacity(obj.len());
                for (k, v) in obj {
                    out.insert(k.clone(), self.json_to_avro(v, &map.types)?);
                }
                Ok(AvroValue::Map(out))
            }

            (AvroSchema::Union(union), json) => self.json_to_union(json, union),

            (AvroSchema::Record(record), JsonValue::Object(obj)) => {
                let fields = record
                    .fields
                    .iter()
                    .map(|field| Ok((field.name.clone(), self.record_field(field, obj)?)))
                    .collect::<CodecResult<Vec<_>>>()?;
                Ok(AvroValue::Record(fields))
            }

            (schema, json) => Err(CodecError::TypeMismatch {
                expected: type_label(schema),
                actual: json.to_string(),
            }),
        }
    }

    fn record_field(
        &self,
        field: &RecordField,
        obj: &serde_json::Map<String, JsonValue>,
    ) -> CodecResult<AvroValue> {
        if let Some(v) = obj.get(&field.name) {
            return self.json_to_avro(v, &field.schema);
        }
        match &field.default {
            // Avro defaults for unions always select the first branch.
            Some(default) => match self.resolve(&field.schema) {
                AvroSchema::Union(union) => {
                    let first = union.variants().first().ok_or_else(|| {
                        CodecError::InvalidValue(format!("Empty union for field {}", field.name))
                    })?;
                    let v = self.json_to_avro(default, first)?;
                    Ok(AvroValue::Union(0, Box::new(v)))
                }
                _ => self.json_to_avro(default, &field.schema),
            },
            None => Err(CodecError::InvalidValue(format!(
                "Missing required field: {}",
                field.name
            ))),
        }
    }

    fn json_to_union(&self, json: &JsonValue, union: &UnionSchema) -> CodecResult<AvroValue> {
        let variants = union.variants();

        if let JsonValue::Object(obj) = json {
            if obj.len() == 1 {
                if let Some((key, inner)) = obj.iter().next() {
                    for (idx, variant) in variants.iter().enumerate() {
                        if self.branch_matches(variant, key) {
                            if let Ok(v) = self.json_to_avro(inner, variant) {
                                return Ok(AvroValue::Union(idx as u32, Box::new(v)));
                            }
                        }
                    }
                }
            }
        }

        if self.options.union_mode == UnionMode::Wrapped && !json.is_null() {
            return Err(CodecError::InvalidValue(format!(
                "Expected wrapped union value {{\"<branch>\": value}}, got {}",
                json
            )));
        }

        for (idx, variant) in variants.iter().enumerate() {
            if let Ok(v) = self.json_to_avro(json, variant) {
                return Ok(AvroValue::Union(idx as u32, Box::new(v)));
            }
        }

        Err(CodecError::InvalidValue(format!(
            "No matching union variant for: {}",
            json
        )))
    }

    fn branch_matches(&self, variant: &AvroSchema, key: &str) -> bool {
        match self.resolve(variant) {
            AvroSchema::Record(r) => key == r.name.fullname(None) || key == r.name.name,
            AvroSchema::Enum(e) => key == e.name.fullname(None) || key == e.name.name,
            AvroSchema::Fixed(f) => key == f.name.fullname(None) || key == f.name.name,
            other => branch_name(other).is_some_and(|name| name == key),
        }
    }

    fn avro_to_json(&self, avro: &AvroValue, schema: Option<&AvroSchema>) -> CodecResult<JsonValue> {
        let schema = schema.map(|s| self.resolve(s));
        match avro {
            AvroValue::Null => Ok(JsonValue::Null),
            AvroValue::Boolean(b) => Ok(JsonValue::Bool(*b)),
            AvroValue::Int(i) | AvroValue::Date(i) | AvroValue::TimeMillis(i) => {
                Ok(JsonValue::from(*i))
            }
            AvroValue::Long(l)
            | AvroValue::TimeMicros(l)
            | AvroValue::TimestampMillis(l)
            | AvroValue::TimestampMicros(l)
            | AvroValue::TimestampNanos(l)
            | AvroValue::LocalTimestampMillis(l)
            | AvroValue::LocalTimestampMicros(l)
            | AvroValue::LocalTimestampNanos(l) => Ok(JsonValue::from(*l)),
            AvroValue::Float(f) => Ok(serde_json::json!(*f)),
            AvroValue::Double(d) => Ok(serde_json::json!(*d)),
            AvroValue::String(s) => Ok(JsonValue::String(s.clone())),
            AvroValue::Uuid(u) => Ok(JsonValue::String(u.to_string())),
            AvroValue::Decimal(d) => {
                let bytes = Vec::<u8>::try_from(d)
                    .map_err(|e| CodecError::Deserialization(e.to_string()))?;
                Ok(JsonValue::String(
                    base64::engine::general_purpose::STANDARD.encode(bytes),
                ))
            }
            AvroValue::BigDecimal(d) => Ok(JsonValue::String(d.to_string())),
            AvroValue::Duration(d) => Ok(serde_json::json!({
                "months": u32::from(d.months()),
                "days": u32::from(d.days()),
                "millis": u32::from(d.millis()),
            })),
            AvroValue::Bytes(b) | AvroValue::Fixed(_, b) => Ok(JsonValue::String(
                base64::engine::general_purpose::STANDARD.encode(b),
            )),
            AvroValue::Enum(_, symbol) => Ok(JsonValue::String(symbol.clone())),
            AvroValue::Array(items) => {
                let item_schema = match schema {
                    Some(AvroSchema::Array(a)) => Some(a.items.as_ref()),
                    _ => None,
                };
                items
                    .iter()
                    .map(|item| self.avro_to_json(item, item_schema))
                    .collect::<CodecResult<Vec<_>>>()
                    .map(JsonValue::Array)
            }
            AvroValue::Map(map) => {
                let value_schema = match schema {
                    Some(AvroSchema::Map(m)) => Some(m.types.as_ref()),
                    _ => None,
                };
                let mut obj = serde_json::Map::new();
                for (k, v) in map {
                    obj.insert(k.clone(), self.avro_to_json(v, value_schema)?);
                }
                Ok(JsonValue::Object(obj))
            }
            AvroValue::Record(fields) => {
                let record = match schema {
                    Some(AvroSchema::Record(r)) => Some(r),
                    _ => None,
                };
                let mut obj = serde_json::Map::new();
                for (name, value) in fields {
                    let field_schema = record.and_then(|r| {
                        r.lookup.get(name).map(|&pos| &r.fields[pos].schema)
                    });
                    obj.insert(name.clone(), self.avro_to_json(value, field_schema)?);
                }
                Ok(JsonValue::Object(obj))
            }
            AvroValue::Union(idx, inner) => {
                let variant = match schema {
                    Some(AvroSchema::Union(u)) => u.variants().get(*idx as usize),
                    _ => None,
                };
                let value = self.avro_to_json(inner, variant)?;
                if self.options.union_mode == UnionMode::Wrapped && !value.is_null() {
                    if let Some(branch) = variant.and_then(|v| self.union_key(v)) {
                        let mut obj = serde_json::Map::new();
                        obj.insert(branch, value);
                        return Ok(JsonValue::Object(obj));
                    }
                }
                Ok(value)
            }
            other => Err(CodecError::InvalidValue(format!(
                "Unsupported Avro value: {:?}",
                other
            ))),
        }
    }

    fn union_key(&self, variant: &AvroSchema) -> Option<String> {
        match self.resolve(variant) {
            AvroSchema::Record(r) => Some(r.name.fullname(None)),
            AvroSchema::Enum(e) => Some(e.name.fullname(None)),
            AvroSchema::Fixed(f) => Some(f.name.fullname(None)),
            other => branch_name(other).map(str::to_string),
        }
    }
}

/// Index every named type in `schema`. A name defined twice is an error.
fn collect_named(schema: &AvroSchema, out: &mut HashMap<String, AvroSchema>) -> CodecResult<()> {
    fn insert(
        name: &Name,
        schema: &AvroSchema,
        out: &mut HashMap<String, AvroSchema>,
    ) -> CodecResult<()> {
        let fullname = name.fullname(None);
        if out.contains_key(&fullname) {
            return Err(CodecError::Parse(format!(
                "Named type '{}' is defined more than once",
                fullname
            )));
        }
        out.insert(fullname, schema.clone());
        Ok(())
    }
    match schema {
        AvroSchema::Record(r) => {
            insert(&r.name, schema, out)?;
            for field in &r.fields {
                collect_named(&field.schema, out)?;
            }
            Ok(())
        }
        AvroSchema::Enum(e) => insert(&e.name, schema, out),
        AvroSchema::Fixed(f) => insert(&f.name, schema, out),
        AvroSchema::Decimal(d) => collect_named(&d.inner, out),
        AvroSchema::Array(a) => collect_named(&a.items, out),
        AvroSchema::Map(m) => collect_named(&m.types, out),
        AvroSchema::Union(u) => u.variants().iter().try_for_each(|v| collect_named(v, out)),
        _ => Ok(()),
    }
}

fn branch_name(schema: &AvroSchema) -> Option<&'static str> {
    match schema {
        AvroSchema::Null => Some("null"),
        AvroSchema::Boolean => Some("boolean"),
        AvroSchema::Int | AvroSchema::Date | AvroSchema::TimeMillis => Some("int"),
        AvroSchema::Long
        | AvroSchema::TimeMicros
        | AvroSchema::TimestampMillis
        | AvroSchema::TimestampMicros
        | AvroSchema::TimestampNanos
        | AvroSchema::LocalTimestampMillis
        | AvroSchema::LocalTimestampMicros
        | AvroSchema::LocalTimestampNanos => Some("long"),
        AvroSchema::Float => Some("float"),
        AvroSchema::Double => Some("double"),
        AvroSchema::Bytes | AvroSchema::BigDecimal => Some("bytes"),
        AvroSchema::String | AvroSchema::Uuid => Some("string"),
        AvroSchema::Array(_) => Some("array"),
        AvroSchema::Map(_) => Some("map"),
        _ => None,
    }
}

fn type_label(schema: &AvroSchema) -> String {
    match schema {
        AvroSchema::Record(r) => format!("record {}", r.name.fullname(None)),
        AvroSchema::Enum(e) => format!("enum {}", e.name.fullname(None)),
        AvroSchema::Fixed(f) => format!("fixed {}", f.name.fullname(None)),
        AvroSchema::Union(_) => "union".to_string(),
        AvroSchema::Decimal(_) => "decimal".to_string(),
        AvroSchema::Duration => "duration".to_string(),
        other => branch_name(other).unwrap_or("unsupported type").to_string(),
    }
}

fn as_i32(n: &serde_json::Number) -> CodecResult<i32> {
    let i = as_i64(n)?;
    i32::try_from(i).map_err(|_| CodecError::InvalidValue(format!("Value {} out of i32 range", i)))
}

fn as_i64(n: &serde_json::Number) -> CodecResult<i64> {
    n.as_i64()
        .ok_or_else(|| CodecError::InvalidValue(format!("Expected integer, got {}", n)))
}

fn as_f64(n: &serde_json::Number) -> CodecResult<f64> {
    n.as_f64()
        .ok_or_else(|| CodecError::InvalidValue(format!("Expected number, got {}", n)))
}

fn decode_base64(s: &str) -> CodecResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|e| CodecError::InvalidValue(format!("Invalid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER: &str = r#"{
        "type": "record",
        "name": "User",
        "namespace": "com.example",
        "fields": [
            {"name": "id", "type": "long"},
            {"name": "name", "type": "string"},
            {"name": "email", "type": ["null", "string"], "default": null}
        ]
    }"#;

    #[test]
    fn test_parse_record_name() {
        let t = AvroType::parse(USER).unwrap();
        assert_eq!(t.name(), Some("com.example.User".to_string()));
        assert_eq!(AvroType::parse(r#""string""#).unwrap().name(), None);
    }

    #[test]
    fn test_parse_malformed() {
        let err = AvroType::parse(r#"{"type": "record", "name": "X"}"#).unwrap_err();
        assert!(matches!(err, CodecError::Parse(_)));
    }

    #[test]
    fn test_same_name_in_separate_parses() {
        let a = r#"{"type":"record","name":"Dup","fields":[{"name":"a","type":"int"}]}"#;
        let b = r#"{"type":"record","name":"Dup","fields":[{"name":"b","type":"string"}]}"#;
        assert!(AvroType::parse(a).is_ok());
        assert!(AvroType::parse(b).is_ok());
    }

    #[test]
    fn test_duplicate_name_within_one_schema() {
        let raw = r#"{"type":"record","name":"Outer","fields":[
            {"name":"a","type":{"type":"record","name":"Inner","fields":[]}},
            {"name":"b","type":{"type":"record","name":"Inner","fields":[]}}
        ]}"#;
        assert!(matches!(AvroType::parse(raw), Err(CodecError::Parse(_))));
    }

    #[test]
    fn test_encode_decode_record() {
        let t = AvroType::parse(USER).unwrap();
        let value = json!({"id": 42, "name": "Alice", "email": "alice@example.com"});
        let bytes = t.encode(&value).unwrap();
        assert_eq!(t.decode(&bytes, None).unwrap(), value);
    }

    #[test]
    fn test_missing_optional_field_uses_default() {
        let t = AvroType::parse(USER).unwrap();
        let bytes = t.encode(&json!({"id": 1, "name": "Bob"})).unwrap();
        assert_eq!(
            t.decode(&bytes, None).unwrap(),
            json!({"id": 1, "name": "Bob", "email": null})
        );
    }

    #[test]
    fn test_missing_required_field() {
        let t = AvroType::parse(USER).unwrap();
        let err = t.encode(&json!({"id": 1})).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_wrapped_union_mode() {
        let t = AvroType::parse_with(
            USER,
            ParserOptions::default().with_union_mode(UnionMode::Wrapped),
        )
        .unwrap();
        let value = json!({"id": 1, "name": "Bob", "email": {"string": "b@example.com"}});
        let bytes = t.encode(&value).unwrap();
        assert_eq!(t.decode(&bytes, None).unwrap(), value);

        assert!(t
            .encode(&json!({"id": 1, "name": "Bob", "email": "b@example.com"}))
            .is_err());
    }

    #[test]
    fn test_recursive_reference() {
        let raw = r#"{"type":"record","name":"Node","fields":[
            {"name":"value","type":"int"},
            {"name":"next","type":["null","Node"],"default":null}
        ]}"#;
        let t = AvroType::parse(raw).unwrap();
        let value = json!({"value": 1, "next": {"value": 2, "next": null}});
        let bytes = t.encode(&value).unwrap();
        assert_eq!(t.decode(&bytes, None).unwrap(), value);
    }

    #[test]
    fn test_bytes_enum_array_map() {
        let raw = r#"{"type":"record","name":"Mixed","fields":[
            {"name":"data","type":"bytes"},
            {"name":"suit","type":{"type":"enum","name":"Suit","symbols":["HEARTS","SPADES"]}},
            {"name":"tags","type":{"type":"array","items":"string"}},
            {"name":"counts","type":{"type":"map","values":"long"}}
        ]}"#;
        let t = AvroType::parse(raw).unwrap();
        let value = json!({
            "data": "AQID",
            "suit": "SPADES",
            "tags": ["a", "b"],
            "counts": {"x": 1}
        });
        let bytes = t.encode(&value).unwrap();
        assert_eq!(t.decode(&bytes, None).unwrap(), value);

        let bad = json!({"data": "AQID", "suit": "CLUBS", "tags": [], "counts": {}});
        assert!(t.encode(&bad).is_err());
    }

    fn round_trip(field_type: &str, value: JsonValue) {
        let raw = format!(
            r#"{{"type":"record","name":"Logical","fields":[{{"name":"v","type":{}}}]}}"#,
            field_type
        );
        let t = AvroType::parse(&raw).unwrap();
        let value = json!({ "v": value });
        let bytes = t.encode(&value).unwrap();
        assert_eq!(t.decode(&bytes, None).unwrap(), value, "{}", field_type);
    }

    #[test]
    fn test_uuid_round_trip() {
        round_trip(
            r#"{"type":"string","logicalType":"uuid"}"#,
            json!("550e8400-e29b-41d4-a716-446655440000"),
        );

        let t = AvroType::parse(r#"{"type":"string","logicalType":"uuid"}"#).unwrap();
        assert!(matches!(
            t.encode(&json!("not-a-uuid")),
            Err(CodecError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_decimal_round_trip() {
        round_trip(
            r#"{"type":"bytes","logicalType":"decimal","precision":10,"scale":2}"#,
            json!("AQI="),
        );
    }

    #[test]
    fn test_fixed_decimal_overflow() {
        let raw = r#"{"type":"record","name":"Price","fields":[{"name":"v","type":
            {"type":"fixed","name":"Amount","size":2,"logicalType":"decimal","precision":4,"scale":2}}]}"#;
        let t = AvroType::parse(raw).unwrap();
        // three bytes do not fit a two-byte fixed
        assert!(matches!(
            t.encode(&json!({"v": "AQID"})),
            Err(CodecError::InvalidValue(_))
        ));
        let bytes = t.encode(&json!({"v": "AQI="})).unwrap();
        assert_eq!(t.decode(&bytes, None).unwrap(), json!({"v": "AQI="}));
    }

    #[test]
    fn test_big_decimal_round_trip() {
        round_trip(
            r#"{"type":"bytes","logicalType":"big-decimal"}"#,
            json!("1234.5678"),
        );
    }

    #[test]
    fn test_timestamp_variants_round_trip() {
        for logical in [
            "timestamp-nanos",
            "local-timestamp-millis",
            "local-timestamp-micros",
            "local-timestamp-nanos",
        ] {
            round_trip(
                &format!(r#"{{"type":"long","logicalType":"{}"}}"#, logical),
                json!(1_700_000_000_123i64),
            );
        }
    }

    #[test]
    fn test_duration_round_trip() {
        round_trip(
            r#"{"type":"fixed","name":"Span","size":12,"logicalType":"duration"}"#,
            json!({"months": 1, "days": 2, "millis": 3000}),
        );
    }

    #[test]
    fn test_write_binary_reports_shortfall() {
        let t = AvroType::parse(r#""string""#).unwrap();
        let value = json!("hello world");
        let needed = t.encode(&value).unwrap().len();

        let mut small = vec![0u8; 4];
        assert_eq!(
            t.write_binary(&value, &mut small).unwrap(),
            BinaryWrite::Insufficient(needed - 4)
        );

        let mut exact = vec![0u8; needed];
        assert_eq!(
            t.write_binary(&value, &mut exact).unwrap(),
            BinaryWrite::Written(needed)
        );
    }

    #[test]
    fn test_copy_leaves_short_buffer_untouched() {
        let datum = [1u8, 2, 3];
        let mut small = [9u8; 2];
        assert_eq!(BinaryWrite::copy(&datum, &mut small), BinaryWrite::Insufficient(1));
        assert_eq!(small, [9, 9]);

        let mut roomy = [9u8; 5];
        assert_eq!(BinaryWrite::copy(&datum, &mut roomy), BinaryWrite::Written(3));
        assert_eq!(roomy, [1, 2, 3, 9, 9]);
    }
}
