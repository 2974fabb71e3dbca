//! TypeScript Emitter
//!
//! Emits one `export interface` per flattened schema. The structural root
//! becomes the `extends` clause; every merged field is declared on the
//! interface, so redeclared base members carry the profile's narrowing.

use std::collections::BTreeSet;

use super::config::{Language, OptionalRepr, RenderProfile};
use super::names::is_plain_identifier;
use super::{resolve_field_type, type_name, GeneratedType, Generator};
use crate::error::CodegenError;
use crate::schema::{FlattenedSchema, Identifier};

/// TypeScript interface generator
#[derive(Debug, Clone)]
pub struct TypeScriptGenerator {
    profile: RenderProfile,
}

impl TypeScriptGenerator {
    pub fn new(profile: RenderProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &RenderProfile {
        &self.profile
    }

    fn member_name(&self, name: &str) -> String {
        if is_plain_identifier(name) {
            name.to_string()
        } else {
            format!("'{}'", name.replace('\'', "\\'"))
        }
    }
}

impl Generator for TypeScriptGenerator {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn generate(&self, schema: &FlattenedSchema) -> Result<GeneratedType, Vec<CodegenError>> {
        let mut imports = BTreeSet::new();
        let mut errors = Vec::new();
        let mut members = String::new();

        for (name, field) in &schema.fields {
            let resolved = match resolve_field_type(&self.profile, schema, name, field, &mut imports) {
                Ok(resolved) => resolved,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            let element = if field.required {
                resolved.rendered
            } else {
                self.profile.wrap_optional(&resolved.rendered)
            };
            let ty = if field.array {
                self.profile.wrap_array(&element)
            } else {
                element
            };
            let marker = if !field.required && self.profile.optional == OptionalRepr::QuestionMark {
                "?"
            } else {
                ""
            };

            members.push_str(&format!("    {}{}: {};\n", self.member_name(name), marker, ty));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let name = type_name(&self.profile, &schema.identifier);
        let mut declaration = format!("/** {} */\n", schema.identifier.url);
        match &schema.base {
            Some(base) => {
                if base != &schema.identifier {
                    imports.insert(base.clone());
                }
                declaration.push_str(&format!(
                    "export interface {} extends {} {{\n",
                    name,
                    type_name(&self.profile, base)
                ));
            }
            None => declaration.push_str(&format!("export interface {} {{\n", name)),
        }
        declaration.push_str(&members);
        declaration.push_str("}\n");

        Ok(GeneratedType {
            identifier: schema.identifier.clone(),
            declaration,
            imports,
        })
    }

    fn file_name(&self, identifier: &Identifier) -> String {
        format!("{}.ts", type_name(&self.profile, identifier))
    }

    fn render_file(&self, generated: &GeneratedType) -> String {
        let mut output = String::new();
        for import in &generated.imports {
            let name = type_name(&self.profile, import);
            output.push_str(&format!("import type {{ {} }} from './{}';\n", name, name));
        }
        if !generated.imports.is_empty() {
            output.push('\n');
        }
        output.push_str(&generated.declaration);
        output
    }
}
