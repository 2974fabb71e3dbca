//! Rust Code Emitter
//!
//! Emits one serde struct per flattened schema.
//!
//! Rust has no struct inheritance, so every merged field is declared directly
//! and the structural root is recorded as an imported, doc-linked type. Named
//! scalar members are boxed: FHIR datatypes reference each other cyclically
//! (Reference -> Identifier -> Reference).

use std::collections::BTreeSet;

use super::config::{Language, RenderProfile};
use super::names::to_snake_case;
use super::{resolve_field_type, type_name, GeneratedType, Generator};
use crate::error::CodegenError;
use crate::schema::{FieldDefinition, FlattenedSchema, Identifier};

/// Rust struct generator
#[derive(Debug, Clone)]
pub struct RustGenerator {
    profile: RenderProfile,
}

impl RustGenerator {
    pub fn new(profile: RenderProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &RenderProfile {
        &self.profile
    }

    fn module_name(&self, identifier: &Identifier) -> String {
        self.profile.escape_keyword(&to_snake_case(&identifier.name))
    }

    fn emit_field(&self, output: &mut String, json_name: &str, field: &FieldDefinition, element: String, named: bool) {
        let rust_name = to_snake_case(json_name);
        if rust_name != json_name {
            output.push_str(&format!("    #[serde(rename = \"{}\")]\n", json_name));
        }

        let full_type = if field.array {
            if !field.required {
                output.push_str("    #[serde(default, skip_serializing_if = \"Vec::is_empty\")]\n");
            }
            self.profile.wrap_array(&element)
        } else {
            let element = if named {
                self.profile.wrap_box(&element)
            } else {
                element
            };
            if field.required {
                element
            } else {
                output.push_str("    #[serde(skip_serializing_if = \"Option::is_none\")]\n");
                self.profile.wrap_optional(&element)
            }
        };

        output.push_str(&format!(
            "    pub {}: {},\n",
            self.profile.escape_keyword(&rust_name),
            full_type
        ));
    }
}

impl Generator for RustGenerator {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn generate(&self, schema: &FlattenedSchema) -> Result<GeneratedType, Vec<CodegenError>> {
        let mut imports = BTreeSet::new();
        let mut errors = Vec::new();
        let mut body = String::new();

        for (name, field) in &schema.fields {
            match resolve_field_type(&self.profile, schema, name, field, &mut imports) {
                Ok(resolved) => self.emit_field(&mut body, name, field, resolved.rendered, resolved.named),
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let name = type_name(&self.profile, &schema.identifier);
        let mut declaration = format!("/// {}\n", schema.identifier.url);
        if let Some(base) = &schema.base {
            if base != &schema.identifier {
                imports.insert(base.clone());
            }
            declaration.push_str("///\n");
            declaration.push_str(&format!(
                "/// Constrains [`{}`].\n",
                type_name(&self.profile, base)
            ));
        }
        declaration.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        declaration.push_str(&format!("pub struct {} {{\n", name));
        declaration.push_str(&body);
        declaration.push_str("}\n");

        Ok(GeneratedType {
            identifier: schema.identifier.clone(),
            declaration,
            imports,
        })
    }

    fn file_name(&self, identifier: &Identifier) -> String {
        format!("{}.rs", to_snake_case(&identifier.name))
    }

    fn render_file(&self, generated: &GeneratedType) -> String {
        let mut output = String::from("use serde::{Deserialize, Serialize};\n");
        for import in &generated.imports {
            output.push_str(&format!(
                "#[allow(unused_imports)]\nuse super::{}::{};\n",
                self.module_name(import),
                type_name(&self.profile, import)
            ));
        }
        output.push('\n');
        output.push_str(&generated.declaration);
        output
    }
}
