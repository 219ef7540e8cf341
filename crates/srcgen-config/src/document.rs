//! KDL representation of a configuration tree.
//!
//! Every entity is a node, scalar fields are properties and lists are
//! children:
//!
//! ```kdl
//! variable "pkg" "org.example"
//! project "domain" path="${rootDir}/domain" maven=#true {
//!     folder "gen" path="src-gen" create=#true override=#true clean=#true
//! }
//! generators project="domain" folder="gen" {
//!     generator "entities" class="entityGen" parser="model" {
//!         property "package" "${pkg}"
//!         artifact "entity" {
//!             target pattern="Abstract" folder="genMainJava"
//!         }
//!     }
//! }
//! ```
//!
//! Parsing does not resolve variables; call [`ConfigTree::init`] for that.

use kdl::{KdlDocument, KdlNode, KdlValue};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::classpath::{Classpath, ClasspathEntry, ClasspathKind};
use crate::generator::{Artifact, GeneratorConfig, Generators, Target};
use crate::parsers::{ParserConfig, Parsers};
use crate::project::{Folder, Project};
use crate::scope::{Named, Scope, ScopeNode, contains_name};
use crate::tree::ConfigTree;
use crate::variables::{Variable, VariableSource};
use crate::{ConfigError, ConfigResult};

/// Read and parse a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<ConfigTree> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        location: path.display().to_string(),
        source,
    })?;
    debug!(path = %path.display(), "Loaded configuration file");
    parse_config(&content)
}

/// Parse a configuration tree from KDL text.
pub fn parse_config(kdl: &str) -> ConfigResult<ConfigTree> {
    let doc: KdlDocument = kdl.parse()?;
    let mut tree = ConfigTree::new();
    let mut blocks: Vec<&str> = Vec::new();

    for node in doc.nodes() {
        let kind = node.name().value();
        if matches!(kind, "classpath" | "parsers" | "generators") {
            if blocks.contains(&kind) {
                return Err(ConfigError::Duplicate(format!("{} block", kind)));
            }
            blocks.push(kind);
        }

        match kind {
            "variable" => add_variable(tree.scope_mut(), node)?,
            "classpath" => tree.classpath = parse_classpath(node)?,
            "project" => push_unique(&mut tree.projects, parse_project(node)?, "project")?,
            "parsers" => tree.parsers = parse_parsers(node)?,
            "generators" => tree.generators = parse_generators(node)?,
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(tree)
}

fn parse_variable(node: &KdlNode) -> ConfigResult<Variable> {
    let name = get_string_arg(node, 0)
        .ok_or_else(|| ConfigError::MissingField("variable name".to_string()))?;

    if let Some(location) = get_string_prop(node, "source") {
        let source = VariableSource {
            location,
            encoding: get_string_prop(node, "encoding"),
        };
        return Ok(Variable::from_source(name, source));
    }

    match get_string_arg(node, 1).or_else(|| get_string_prop(node, "value")) {
        Some(value) => Ok(Variable::new(name, value)),
        None => Ok(Variable::unset(name)),
    }
}

fn add_variable(scope: &mut Scope, node: &KdlNode) -> ConfigResult<()> {
    let variable = parse_variable(node)?;
    if contains_name(scope.variables(), variable.name()) {
        return Err(ConfigError::Duplicate(format!(
            "variable '{}'",
            variable.name()
        )));
    }
    scope.set_variable(variable);
    Ok(())
}

fn parse_classpath(node: &KdlNode) -> ConfigResult<Classpath> {
    let mut classpath = Classpath::new();

    for child in children(node) {
        let kind = match child.name().value() {
            "variable" => {
                add_variable(classpath.scope_mut(), child)?;
                continue;
            }
            "bin" => ClasspathKind::Bin,
            "jar" => ClasspathKind::Jar,
            _ => continue,
        };
        let path = get_string_arg(child, 0)
            .ok_or_else(|| ConfigError::MissingField("classpath entry path".to_string()))?;
        classpath.entries.push(ClasspathEntry::new(kind, path));
    }

    Ok(classpath)
}

fn parse_project(node: &KdlNode) -> ConfigResult<Project> {
    let name = get_string_arg(node, 0)
        .ok_or_else(|| ConfigError::MissingField("project name".to_string()))?;
    let path = get_string_prop(node, "path")
        .ok_or_else(|| ConfigError::MissingField(format!("path for project '{}'", name)))?;

    let mut project = Project::new(name, path).with_maven(get_bool_prop(node, "maven")?.unwrap_or(false));

    for child in children(node) {
        match child.name().value() {
            "variable" => add_variable(project.scope_mut(), child)?,
            "folder" => push_unique(&mut project.folders, parse_folder(child)?, "folder")?,
            _ => {}
        }
    }

    Ok(project)
}

fn parse_folder(node: &KdlNode) -> ConfigResult<Folder> {
    let name = get_string_arg(node, 0)
        .ok_or_else(|| ConfigError::MissingField("folder name".to_string()))?;
    let path = get_string_prop(node, "path")
        .ok_or_else(|| ConfigError::MissingField(format!("path for folder '{}'", name)))?;

    let mut folder = Folder::new(name, path);
    folder.create = get_bool_prop(node, "create")?.unwrap_or(false);
    folder.override_existing = get_bool_prop(node, "override")?.unwrap_or(false);
    folder.clean = get_bool_prop(node, "clean")?.unwrap_or(false);
    folder.clean_exclude = get_string_prop(node, "clean-exclude");

    for child in children(node) {
        if child.name().value() == "variable" {
            add_variable(folder.scope_mut(), child)?;
        }
    }

    Ok(folder)
}

fn parse_parsers(node: &KdlNode) -> ConfigResult<Parsers> {
    let mut parsers = Parsers::new();

    for child in children(node) {
        match child.name().value() {
            "variable" => add_variable(parsers.scope_mut(), child)?,
            "parser" => push_unique(&mut parsers.parsers, parse_parser(child)?, "parser")?,
            _ => {}
        }
    }

    Ok(parsers)
}

fn parse_parser(node: &KdlNode) -> ConfigResult<ParserConfig> {
    let name = get_string_arg(node, 0)
        .ok_or_else(|| ConfigError::MissingField("parser name".to_string()))?;
    let class_name = get_string_prop(node, "class")
        .ok_or_else(|| ConfigError::MissingField(format!("class for parser '{}'", name)))?;

    let mut parser = ParserConfig::new(name, class_name);

    for child in children(node) {
        match child.name().value() {
            "variable" => add_variable(parser.scope_mut(), child)?,
            "property" => add_property(&mut parser.properties, child)?,
            _ => {}
        }
    }

    Ok(parser)
}

fn parse_generators(node: &KdlNode) -> ConfigResult<Generators> {
    let mut generators = Generators::new().with_routing(
        get_string_prop(node, "project").as_deref(),
        get_string_prop(node, "folder").as_deref(),
    );

    for child in children(node) {
        match child.name().value() {
            "variable" => add_variable(generators.scope_mut(), child)?,
            "generator" => push_unique(
                &mut generators.generators,
                parse_generator(child)?,
                "generator",
            )?,
            _ => {}
        }
    }

    Ok(generators)
}

fn parse_generator(node: &KdlNode) -> ConfigResult<GeneratorConfig> {
    let name = get_string_arg(node, 0)
        .ok_or_else(|| ConfigError::MissingField("generator name".to_string()))?;
    let class_name = get_string_prop(node, "class")
        .ok_or_else(|| ConfigError::MissingField(format!("class for generator '{}'", name)))?;

    let mut generator = GeneratorConfig::new(name, class_name).with_routing(
        get_string_prop(node, "project").as_deref(),
        get_string_prop(node, "folder").as_deref(),
    );
    generator.parser = get_string_prop(node, "parser");

    for child in children(node) {
        match child.name().value() {
            "variable" => add_variable(generator.scope_mut(), child)?,
            "property" => add_property(&mut generator.properties, child)?,
            "artifact" => push_unique(
                &mut generator.artifacts,
                parse_artifact(child)?,
                "artifact",
            )?,
            _ => {}
        }
    }

    Ok(generator)
}

fn parse_artifact(node: &KdlNode) -> ConfigResult<Artifact> {
    let name = get_string_arg(node, 0)
        .ok_or_else(|| ConfigError::MissingField("artifact name".to_string()))?;

    let mut artifact = Artifact::new(name).with_routing(
        get_string_prop(node, "project").as_deref(),
        get_string_prop(node, "folder").as_deref(),
    );

    for child in children(node) {
        match child.name().value() {
            "variable" => add_variable(artifact.scope_mut(), child)?,
            "target" => artifact.targets.push(parse_target(child)?),
            _ => {}
        }
    }

    Ok(artifact)
}

fn parse_target(node: &KdlNode) -> ConfigResult<Target> {
    let mut target = Target::new(
        get_string_prop(node, "pattern").as_deref(),
        get_string_prop(node, "project").as_deref(),
        get_string_prop(node, "folder").as_deref(),
    );

    for child in children(node) {
        if child.name().value() == "variable" {
            add_variable(target.scope_mut(), child)?;
        }
    }

    Ok(target)
}

fn add_property(properties: &mut BTreeMap<String, String>, node: &KdlNode) -> ConfigResult<()> {
    let key = get_string_arg(node, 0)
        .ok_or_else(|| ConfigError::MissingField("property name".to_string()))?;
    let value = get_string_arg(node, 1)
        .ok_or_else(|| ConfigError::MissingField(format!("value of property '{}'", key)))?;
    if properties.insert(key.clone(), value).is_some() {
        return Err(ConfigError::Duplicate(format!("property '{}'", key)));
    }
    Ok(())
}

fn push_unique<T: Named>(items: &mut Vec<T>, item: T, kind: &str) -> ConfigResult<()> {
    if contains_name(items, item.name()) {
        return Err(ConfigError::Duplicate(format!("{} '{}'", kind, item.name())));
    }
    items.push(item);
    Ok(())
}

// Helper functions for extracting values from KDL nodes

fn children(node: &KdlNode) -> impl Iterator<Item = &KdlNode> {
    node.children().into_iter().flat_map(|doc| doc.nodes())
}

// Scalars are read as text; only `#null` counts as absent.
fn scalar_text(value: &KdlValue) -> Option<String> {
    match value {
        KdlValue::String(s) => Some(s.clone()),
        KdlValue::Integer(i) => Some(i.to_string()),
        KdlValue::Float(f) => Some(f.to_string()),
        KdlValue::Bool(b) => Some(b.to_string()),
        KdlValue::Null => None,
    }
}

fn get_string_arg(node: &KdlNode, index: usize) -> Option<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .nth(index)
        .and_then(|e| scalar_text(e.value()))
}

fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name).and_then(scalar_text)
}

fn get_bool_prop(node: &KdlNode, name: &str) -> ConfigResult<Option<bool>> {
    match node.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: name.to_string(),
                message: format!("expected a boolean, got {}", value),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::RoutingNode;
    use srcgen_core::InitContext;

    const SAMPLE: &str = r#"
        variable "pkg" "org.example"
        variable "gen" value="src-gen"

        classpath {
            jar "lib/plugins.jar"
        }

        project "domain" path="${rootDir}/domain" maven=#true {
            variable "suffix" "java"
            folder "custom" path="${gen}/${suffix}" create=#true override=#true clean=#true clean-exclude="\\.gitkeep$"
        }

        parsers {
            parser "model" class="modelParser" {
                property "input" "${rootDir}/model"
            }
        }

        generators project="domain" folder="genMainJava" {
            generator "entities" class="entityGen" parser="model" {
                property "package" "${pkg}.entities"
                artifact "entity" {
                    target pattern="Abstract" folder="custom"
                }
                artifact "dto" project="domain" folder="genMainRes"
            }
        }
    "#;

    #[test]
    fn test_parse_sample() {
        let tree = parse_config(SAMPLE).unwrap();

        assert_eq!(tree.scope().variables().len(), 2);
        assert_eq!(tree.classpath.entries.len(), 1);
        assert_eq!(tree.classpath.entries[0].kind, ClasspathKind::Jar);

        let project = tree.find_project("domain").unwrap();
        assert!(project.maven);
        assert_eq!(project.folders.len(), 1);
        let folder = &project.folders[0];
        assert!(folder.create && folder.override_existing && folder.clean);
        assert_eq!(folder.clean_exclude.as_deref(), Some(r"\.gitkeep$"));

        let parser = tree.find_parser("model").unwrap();
        assert_eq!(parser.class_name, "modelParser");
        assert_eq!(parser.properties["input"], "${rootDir}/model");

        let generator = tree.find_generator("entities").unwrap();
        assert_eq!(generator.parser.as_deref(), Some("model"));
        assert_eq!(generator.artifacts.len(), 2);
        assert_eq!(generator.artifacts[0].targets[0].pattern.as_deref(), Some("Abstract"));
        assert_eq!(tree.generators.project(), Some("domain"));
    }

    #[test]
    fn test_parse_then_init_and_bind() {
        let mut tree = parse_config(SAMPLE).unwrap();
        tree.init(InitContext::default(), "/work").unwrap();

        let project = tree.find_project("domain").unwrap();
        assert_eq!(project.path, "/work/domain");
        assert_eq!(project.folders.len(), 9);
        assert_eq!(project.find_folder("custom").unwrap().path, "src-gen/java");

        let generator = tree.find_generator("entities").unwrap();
        assert_eq!(generator.properties["package"], "org.example.entities");
        assert_eq!(tree.find_parser("model").unwrap().properties["input"], "/work/model");

        let folder = tree
            .find_target_folder("entities", "entity", Some("org/example/AbstractFoo.java"))
            .unwrap();
        assert_eq!(folder.name, "custom");
        let folder = tree
            .find_target_folder("entities", "entity", Some("org/example/Foo.java"))
            .unwrap();
        assert_eq!(folder.name, "genMainJava");
        assert_eq!(
            tree.find_target_dir("entities", "dto", None).unwrap(),
            Path::new("/work/domain/src-gen/main/resources")
        );
    }

    #[test]
    fn test_variable_from_source() {
        let tree = parse_config(
            r#"variable "license" source="file:///etc/license.txt" encoding="UTF-8""#,
        )
        .unwrap();
        let variable = &tree.scope().variables()[0];
        let source = variable.source().unwrap();
        assert_eq!(source.location, "file:///etc/license.txt");
        assert_eq!(source.encoding.as_deref(), Some("UTF-8"));
        assert_eq!(variable.raw_value(), None);
    }

    #[test]
    fn test_missing_project_path() {
        let result = parse_config(r#"project "p""#);
        assert!(matches!(result, Err(ConfigError::MissingField(ref f)) if f.contains("path")));
    }

    #[test]
    fn test_missing_generator_class() {
        let result = parse_config(r#"generators { generator "g" }"#);
        assert!(matches!(result, Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_duplicate_names() {
        let result = parse_config(
            r#"
            project "p" path="a"
            project "p" path="b"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Duplicate(ref d)) if d == "project 'p'"));

        let result = parse_config(
            r#"
            variable "a" "1"
            variable "a" "2"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Duplicate(_))));
    }

    #[test]
    fn test_duplicate_blocks() {
        let result = parse_config(
            r#"
            generators { generator "g1" class="a" }
            generators { generator "g2" class="b" }
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Duplicate(ref d)) if d == "generators block"));

        for block in ["classpath", "parsers"] {
            let result = parse_config(&format!("{block}\n{block}"));
            assert!(matches!(result, Err(ConfigError::Duplicate(ref d)) if *d == format!("{block} block")));
        }
    }

    #[test]
    fn test_scalar_values_read_as_text() {
        let mut tree = parse_config(
            r#"
            variable "version" 2
            variable "enabled" #true
            variable "ratio" 0.5
            variable "jar" "lib-${version}.jar"
            variable "nothing" #null
            project "p" path="out" {
                folder "f1" path="one"
                folder "f2" path="two"
            }
            generators project="p" folder="f2" {
                generator "g" class="gen" {
                    property "threads" 4
                    artifact "a" {
                        target pattern=42 folder="f1"
                    }
                }
            }
            "#,
        )
        .unwrap();
        tree.init(InitContext::default(), "/work").unwrap();

        let vars = tree.var_map();
        assert_eq!(vars["version"], "2");
        assert_eq!(vars["enabled"], "true");
        assert_eq!(vars["ratio"], "0.5");
        assert_eq!(vars["jar"], "lib-2.jar");
        assert_eq!(vars["nothing"], "");

        let generator = tree.find_generator("g").unwrap();
        assert_eq!(generator.properties["threads"], "4");
        assert_eq!(generator.artifacts[0].targets[0].pattern.as_deref(), Some("42"));

        let folder = tree.find_target_folder("g", "a", Some("x/Foo.java")).unwrap();
        assert_eq!(folder.name, "f2");
        let folder = tree.find_target_folder("g", "a", Some("x/Foo42.java")).unwrap();
        assert_eq!(folder.name, "f1");
    }

    #[test]
    fn test_invalid_bool() {
        let result = parse_config(r#"project "p" path="a" maven="yes""#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { ref field, .. }) if field == "maven"));
    }

    #[test]
    fn test_invalid_kdl() {
        assert!(matches!(parse_config("project {"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_nodes_ignored() {
        let tree = parse_config(
            r#"
            cleaner "whatever"
            project "p" path="a" {
                unknown 1
            }
            "#,
        )
        .unwrap();
        assert_eq!(tree.projects.len(), 1);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("srcgen.kdl");
        std::fs::write(&path, SAMPLE).unwrap();

        let tree = load_config(&path).unwrap();
        assert!(tree.find_project("domain").is_some());
        assert!(matches!(
            load_config(dir.path().join("missing.kdl")),
            Err(ConfigError::Io { .. })
        ));
    }
}
