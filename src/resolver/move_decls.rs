use itertools::Itertools;
use std::collections::HashMap;
use tree_sitter::Node;

use super::ScopeResolver;
use crate::error::InspectResult;
use crate::instrument_block;
use crate::parser::parse_well_formed;
use crate::scope::{Binding, Member, ScopeNode, TypeDescriptor};

const PRIMITIVES: &[&str] = &[
    "u8", "u16", "u32", "u64", "u128", "u256", "bool", "address", "signer",
];

const STRUCT_KINDS: &[&str] = &[
    "struct_definition",
    "native_struct_definition",
    "datatype_definition",
];

/// Declared fields per struct of a module, as `(name, type text)`. Positional
/// fields are named by index.
type FieldTable = HashMap<String, Vec<(String, String)>>;

const FUNCTION_KINDS: &[&str] = &[
    "function_definition",
    "native_function_definition",
    "macro_function_definition",
];

/// Declaration-level resolver for Move source.
///
/// Types come from the annotations written in the source; nothing is
/// inferred, so an unannotated `let` produces an unresolved binding.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveScopeResolver;

impl MoveScopeResolver {
    pub fn new() -> Self {
        Self
    }
}

impl ScopeResolver for MoveScopeResolver {
    fn resolve(&self, source: &str) -> InspectResult<ScopeNode> {
        let tree = parse_well_formed(source)?;
        let root = tree.root_node();
        Ok(instrument_block!("resolve::move", { build_root(root, source) }))
    }
}

/// Map a Move type annotation to a descriptor.
pub fn move_type(text: &str) -> TypeDescriptor {
    let text = text.split_whitespace().join(" ");
    if PRIMITIVES.contains(&text.as_str()) {
        return TypeDescriptor::basic(text);
    }
    if let Some(inner) = text
        .strip_prefix("vector<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        return TypeDescriptor::slice(move_type(inner));
    }
    TypeDescriptor::other(text)
}

fn build_root(root: Node<'_>, source: &str) -> ScopeNode {
    let mut modules = Vec::new();
    collect_kind(root, "module_definition", &mut modules);

    let mut scope = ScopeNode::new();
    for module in modules {
        let ident = module_identity(module, source);
        let name = ident.rsplit("::").next().unwrap_or(&ident).to_string();
        scope.bindings.push(Binding::new(
            name,
            TypeDescriptor::other(format!("module {ident}")),
        ));
        scope.children.push(build_module(module, source, &ident));
    }
    scope
}

fn collect_kind<'t>(node: Node<'t>, kind: &str, out: &mut Vec<Node<'t>>) {
    if node.kind() == kind {
        out.push(node);
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_kind(child, kind, out);
    }
}

fn module_identity(module: Node<'_>, source: &str) -> String {
    if let Some(ident) = module.child_by_field_name("module_identity") {
        return compact(slice(source, ident));
    }
    let text = slice(source, module);
    let after_keyword = text
        .find("module")
        .map_or(text, |at| &text[at + "module".len()..]);
    let end = after_keyword
        .find([';', '{'])
        .unwrap_or(after_keyword.len());
    compact(&after_keyword[..end])
}

fn build_module(module: Node<'_>, source: &str, ident: &str) -> ScopeNode {
    let mut items = Vec::new();
    collect_items(module, &mut items);

    // Unpack patterns may name structs declared after the function.
    let table: FieldTable = items
        .iter()
        .filter(|item| STRUCT_KINDS.contains(&item.kind()))
        .map(|item| {
            let name = item_name(*item, "struct", source);
            (name, struct_fields(*item, source))
        })
        .collect();

    let mut scope = ScopeNode::labeled(format!("module {ident}"));
    let mut structs: HashMap<String, usize> = HashMap::new();
    let mut functions: Vec<Signature> = Vec::new();

    for item in &items {
        let kind = item.kind();
        if kind == "constant" {
            let name = field_text(*item, "name", source).unwrap_or_default();
            let ty = field_text(*item, "type", source).map(|t| move_type(&t));
            scope.bindings.push(Binding { name, ty });
        } else if STRUCT_KINDS.contains(&kind) {
            let name = item_name(*item, "struct", source);
            let fields = table.get(&name).map(Vec::as_slice).unwrap_or_default();
            let underlying = TypeDescriptor::Struct {
                fields: fields
                    .iter()
                    .map(|(field, ty)| Member::new(field.clone(), move_type(ty)))
                    .collect(),
            };
            structs.insert(name.clone(), scope.bindings.len());
            scope
                .bindings
                .push(Binding::new(name.clone(), TypeDescriptor::named(name, underlying)));
        } else if kind == "enum_definition" {
            let name = item_name(*item, "enum", source);
            scope.bindings.push(Binding::new(
                name.clone(),
                TypeDescriptor::named(name, TypeDescriptor::other("enum")),
            ));
        } else if FUNCTION_KINDS.contains(&kind) {
            let sig = signature(*item, source);
            scope.bindings.push(Binding::new(sig.name.clone(), sig.descriptor()));
            if let Some(body) = item.child_by_field_name("body") {
                scope.children.push(function_scope(&sig, body, source, &table));
            }
            functions.push(sig);
        }
    }

    attach_methods(&mut scope, &structs, &functions);

    #[cfg(feature = "telemetry")]
    tracing::debug!(
        module = %ident,
        bindings = scope.bindings.len(),
        scopes = scope.children.len(),
        "resolved module"
    );

    scope
}

/// Name of a struct or enum: the `name` field, else the word after `keyword`.
fn item_name(node: Node<'_>, keyword: &str, source: &str) -> String {
    if let Some(name) = field_text(node, "name", source) {
        return name;
    }
    slice(source, node)
        .split_whitespace()
        .skip_while(|word| *word != keyword)
        .nth(1)
        .map(|word| {
            let end = word.find(['<', '(', '{']).unwrap_or(word.len());
            word[..end].to_string()
        })
        .unwrap_or_default()
}

/// Module members in source order. Function bodies are not entered.
fn collect_items<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let kind = child.kind();
        // Some grammar revisions wrap struct and enum definitions.
        let wrapper =
            kind == "datatype_definition" && child.child_by_field_name("name").is_none();
        if !wrapper
            && (kind == "constant"
                || kind == "enum_definition"
                || STRUCT_KINDS.contains(&kind)
                || FUNCTION_KINDS.contains(&kind))
        {
            out.push(child);
        } else if kind != "block" && child.named_child_count() > 0 {
            collect_items(child, out);
        }
    }
}

/// Move method syntax: `x.f()` resolves to a function of the type's module
/// whose first parameter is the type itself or a reference to it.
fn attach_methods(scope: &mut ScopeNode, structs: &HashMap<String, usize>, functions: &[Signature]) {
    for sig in functions {
        let Some((_, _, receiver)) = sig.params.first() else {
            continue;
        };
        let Some(&index) = structs.get(receiver_name(receiver)) else {
            continue;
        };
        if let Some(TypeDescriptor::Named { methods, .. }) = scope.bindings[index].ty.as_mut() {
            methods.push(Member::new(sig.name.clone(), sig.descriptor()));
        }
    }
}

fn receiver_name(type_text: &str) -> &str {
    let t = type_text.trim().trim_start_matches('&').trim_start();
    let t = t.strip_prefix("mut ").unwrap_or(t).trim();
    let t = t.split('<').next().unwrap_or(t);
    t.rsplit("::").next().unwrap_or(t).trim()
}

struct Signature {
    name: String,
    /// (name, descriptor, annotation text)
    params: Vec<(String, TypeDescriptor, String)>,
    results: Vec<TypeDescriptor>,
}

impl Signature {
    fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::function(
            self.params.iter().map(|(_, ty, _)| ty.clone()).collect(),
            self.results.clone(),
        )
    }
}

fn signature(node: Node<'_>, source: &str) -> Signature {
    let name = field_text(node, "name", source).unwrap_or_default();

    let mut params = Vec::new();
    let Some(param_list) = node.child_by_field_name("parameters") else {
        return Signature {
            name,
            params,
            results: Vec::new(),
        };
    };

    let mut cursor = param_list.walk();
    for param in param_list.children(&mut cursor) {
        if param.kind() != "function_parameter" && param.kind() != "mut_function_parameter" {
            continue;
        }
        let (text_name, text_ty) = split_annotation(slice(source, param));
        let pname = field_text(param, "name", source).unwrap_or(text_name);
        let pty = field_text(param, "type", source).unwrap_or(text_ty);
        params.push((pname, move_type(&pty), pty));
    }

    // Whatever sits between the parameter list and the body is the return
    // annotation, e.g. `: (u64, bool)` or `: u64 acquires Store`. Parameter
    // lists of macro functions may be followed by nothing at all.
    let tail_end = node
        .child_by_field_name("body")
        .map_or(node.end_byte(), |b| b.start_byte());
    let tail = source
        .get(param_list.end_byte()..tail_end)
        .unwrap_or("")
        .trim()
        .trim_end_matches(';');
    let results = match tail.strip_prefix(':') {
        Some(ret) => {
            let ret = strip_acquires(ret);
            tuple_elements(&ret)
                .unwrap_or_else(|| vec![ret.clone()])
                .iter()
                .map(|t| move_type(t))
                .collect()
        }
        None => Vec::new(),
    };

    Signature {
        name,
        params,
        results,
    }
}

fn struct_fields(node: Node<'_>, source: &str) -> Vec<(String, String)> {
    let mut annotations = Vec::new();
    collect_kind_all(node, "field_annotation", &mut annotations);
    if !annotations.is_empty() {
        return annotations
            .into_iter()
            .map(|field| {
                let (text_name, text_ty) = split_annotation(slice(source, field));
                let name = field_text(field, "field", source).unwrap_or(text_name);
                let ty = field_text(field, "type", source).unwrap_or(text_ty);
                (name, ty)
            })
            .collect();
    }

    let mut positional = Vec::new();
    collect_kind(node, "positional_fields", &mut positional);
    if let Some(fields) = positional.first() {
        let mut cursor = fields.walk();
        return fields
            .named_children(&mut cursor)
            .enumerate()
            .map(|(i, ty)| (i.to_string(), compact_type(slice(source, ty))))
            .collect();
    }

    // Grammar revisions name the field nodes differently; read the text.
    // Whichever of `{` or `(` opens first holds the fields.
    let text = slice(source, node);
    let Some(open) = text.find(['{', '(']) else {
        return Vec::new();
    };
    let Some(inner) = delimited(&text[open..]) else {
        return Vec::new();
    };
    let fields = split_top_level(inner).into_iter().filter(|f| !f.is_empty());
    if text[open..].starts_with('(') {
        fields
            .enumerate()
            .map(|(i, ty)| (i.to_string(), compact_type(&ty)))
            .collect()
    } else {
        fields.map(|f| split_annotation(&f)).collect()
    }
}

fn collect_kind_all<'t>(node: Node<'t>, kind: &str, out: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == kind {
            out.push(child);
        } else {
            collect_kind_all(child, kind, out);
        }
    }
}

fn function_scope(sig: &Signature, body: Node<'_>, source: &str, table: &FieldTable) -> ScopeNode {
    let mut scope = ScopeNode::labeled(format!("fun {}", sig.name));
    for (name, ty, _) in &sig.params {
        scope.bindings.push(Binding::new(name.clone(), ty.clone()));
    }
    collect_block(body, source, table, &mut scope);
    scope
}

/// `let` bindings land in `scope`; every nested block opens a child scope.
fn collect_block(node: Node<'_>, source: &str, table: &FieldTable, scope: &mut ScopeNode) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "let_statement" => {
                scope.bindings.extend(let_bindings(child, source, table));
                collect_block(child, source, table, scope);
            }
            "block" => {
                let mut inner = ScopeNode::labeled("block");
                collect_block(child, source, table, &mut inner);
                scope.children.push(inner);
            }
            _ => collect_block(child, source, table, scope),
        }
    }
}

fn let_bindings(node: Node<'_>, source: &str, table: &FieldTable) -> Vec<Binding> {
    let text = slice(source, node).trim();
    let head = text.strip_prefix("let").unwrap_or(text);
    let head = head.split('=').next().unwrap_or(head).trim_end_matches(';');
    let (text_binds, text_ty) = split_annotation(head);

    let binds = field_text(node, "binds", source).unwrap_or(text_binds);
    let annotation = field_text(node, "type", source)
        .or_else(|| (!text_ty.is_empty()).then_some(text_ty));

    let mut out = Vec::new();
    bind_pattern(&binds, annotation.as_deref(), table, &mut out);
    out
}

/// Push one binding per variable `pattern` introduces, left to right.
///
/// `ty` is the annotation text for the whole pattern. Tuple annotations are
/// split across tuple patterns, and unpacked fields of a struct in `table`
/// take the field's declared type.
fn bind_pattern(pattern: &str, ty: Option<&str>, table: &FieldTable, out: &mut Vec<Binding>) {
    let pattern = pattern.trim();
    let pattern = pattern.strip_prefix("mut ").map_or(pattern, str::trim_start);
    if pattern.is_empty() || pattern == "_" || pattern == ".." {
        return;
    }

    if let Some(elems) = tuple_elements(pattern) {
        let parts = ty
            .and_then(tuple_elements)
            .filter(|parts| parts.len() == elems.len());
        for (i, elem) in elems.iter().enumerate() {
            let part = parts.as_ref().map(|parts| parts[i].as_str());
            bind_pattern(elem, part, table, out);
        }
        return;
    }

    let Some(open) = pattern.find(['{', '(']) else {
        out.push(Binding {
            name: pattern.to_string(),
            ty: ty.map(move_type),
        });
        return;
    };
    let Some(inner) = delimited(&pattern[open..]) else {
        return;
    };
    let fields = table.get(receiver_name(&pattern[..open]));
    let field_type = |name: &str| {
        fields
            .and_then(|fields| fields.iter().find(|(field, _)| field == name))
            .map(|(_, ty)| ty.as_str())
    };

    for (i, part) in split_top_level(inner).iter().enumerate() {
        if pattern[open..].starts_with('(') {
            let ty = fields
                .and_then(|fields| fields.get(i))
                .map(|(_, ty)| ty.as_str());
            bind_pattern(part, ty, table, out);
            continue;
        }
        let (field, sub) = split_annotation(part);
        if sub.is_empty() {
            bind_pattern(&field, field_type(&field), table, out);
        } else {
            bind_pattern(&sub, field_type(&field), table, out);
        }
    }
}

fn field_text(node: Node<'_>, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|n| slice(source, n).trim().to_string())
        .filter(|t| !t.is_empty())
}

fn slice<'a>(source: &'a str, node: Node<'_>) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn compact_type(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// Return annotation with any `acquires` list removed.
fn strip_acquires(ret: &str) -> String {
    ret.split_whitespace()
        .take_while(|word| *word != "acquires")
        .join(" ")
}

/// Contents of the group opened by the first char of `text`, up to its
/// matching close.
fn delimited(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '<' | '[' | '{' => depth += 1,
            ')' | '>' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// `name: type` split on the first single colon outside any brackets
/// (paths use `::`).
fn split_annotation(text: &str) -> (String, String) {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'<' | b'[' | b'{' => depth += 1,
            b')' | b'>' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if bytes[i] == b':' && depth == 0 {
            if bytes.get(i + 1) == Some(&b':') {
                i += 2;
                continue;
            }
            let name = text[..i].trim();
            let name = name.strip_prefix("mut ").unwrap_or(name).trim();
            return (name.to_string(), text[i + 1..].trim().to_string());
        }
        i += 1;
    }
    (text.trim().to_string(), String::new())
}

/// Elements of a parenthesized list, or `None` when `text` is not one.
fn tuple_elements(text: &str) -> Option<Vec<String>> {
    let inner = text.trim().strip_prefix('(')?.strip_suffix(')')?;
    Some(
        split_top_level(inner)
            .into_iter()
            .filter(|e| !e.is_empty())
            .collect(),
    )
}

fn split_top_level(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '<' | '[' | '{' => depth += 1,
            ')' | '>' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(text[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(text[start..].trim().to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_primitives_and_vectors() {
        assert_eq!(move_type("u64"), TypeDescriptor::basic("u64"));
        assert_eq!(move_type(" address "), TypeDescriptor::basic("address"));
        assert_eq!(
            move_type("vector<vector<u8>>"),
            TypeDescriptor::slice(TypeDescriptor::slice(TypeDescriptor::basic("u8")))
        );
        assert_eq!(move_type("&mut   TxContext"), TypeDescriptor::other("&mut TxContext"));
        assert_eq!(move_type("Coin<SUI>"), TypeDescriptor::other("Coin<SUI>"));
    }

    #[test]
    fn receiver_strips_references_generics_and_paths() {
        assert_eq!(receiver_name("&mut Pool<T>"), "Pool");
        assert_eq!(receiver_name("&Pool"), "Pool");
        assert_eq!(receiver_name("pkg::m::Pool"), "Pool");
        assert_eq!(receiver_name("u64"), "u64");
    }

    #[test]
    fn annotation_split_ignores_path_separators() {
        assert_eq!(
            split_annotation("mut id: sui::object::UID"),
            ("id".to_string(), "sui::object::UID".to_string())
        );
        assert_eq!(split_annotation("x"), ("x".to_string(), String::new()));
    }

    #[test]
    fn annotation_split_skips_colons_inside_patterns() {
        assert_eq!(
            split_annotation(" Pair { a, b: _ } "),
            ("Pair { a, b: _ }".to_string(), String::new())
        );
        assert_eq!(
            split_annotation("(x, y): (u64, bool)"),
            ("(x, y)".to_string(), "(u64, bool)".to_string())
        );
    }

    fn pair_table() -> FieldTable {
        let mut table = FieldTable::new();
        table.insert(
            "Pair".to_string(),
            vec![
                ("a".to_string(), "u64".to_string()),
                ("b".to_string(), "vector<u8>".to_string()),
            ],
        );
        table.insert(
            "Wrapper".to_string(),
            vec![("0".to_string(), "bool".to_string())],
        );
        table
    }

    fn bound(pattern: &str, ty: Option<&str>) -> Vec<Binding> {
        let mut out = Vec::new();
        bind_pattern(pattern, ty, &pair_table(), &mut out);
        out
    }

    #[test]
    fn unpack_binds_field_variables_with_field_types() {
        assert_eq!(
            bound("Pair { a, b: _ }", None),
            vec![Binding::new("a", TypeDescriptor::basic("u64"))]
        );
        assert_eq!(
            bound("Pair { a: mut first, b }", None),
            vec![
                Binding::new("first", TypeDescriptor::basic("u64")),
                Binding::new("b", TypeDescriptor::slice(TypeDescriptor::basic("u8"))),
            ]
        );
        assert_eq!(
            bound("Wrapper(flag)", None),
            vec![Binding::new("flag", TypeDescriptor::basic("bool"))]
        );
    }

    #[test]
    fn unknown_struct_fields_stay_unresolved() {
        assert_eq!(
            bound("other::Thing { x, y: renamed, .. }", None),
            vec![Binding::unresolved("x"), Binding::unresolved("renamed")]
        );
    }

    #[test]
    fn tuple_patterns_split_their_annotation() {
        assert_eq!(
            bound("(Pair { a, b }, c)", None),
            vec![
                Binding::new("a", TypeDescriptor::basic("u64")),
                Binding::new("b", TypeDescriptor::slice(TypeDescriptor::basic("u8"))),
                Binding::unresolved("c"),
            ]
        );
        assert_eq!(
            bound("(mut x, _, y)", Some("(u64, bool, address)")),
            vec![
                Binding::new("x", TypeDescriptor::basic("u64")),
                Binding::new("y", TypeDescriptor::basic("address")),
            ]
        );
        assert_eq!(
            bound("(x, y)", Some("u64")),
            vec![Binding::unresolved("x"), Binding::unresolved("y")]
        );
    }

    #[test]
    fn acquires_is_cut_after_any_whitespace() {
        assert_eq!(strip_acquires(" u64 acquires Store"), "u64");
        assert_eq!(strip_acquires(" u64\tacquires Store"), "u64");
        assert_eq!(strip_acquires(" (u64,\nbool)\nacquires A, B"), "(u64, bool)");
    }

    #[test]
    fn delimited_stops_at_the_matching_close() {
        assert_eq!(
            delimited("{ a: vector<u8>, b: Inner { c } } has drop"),
            Some(" a: vector<u8>, b: Inner { c } ")
        );
        assert_eq!(delimited("(u64, bool) has copy;"), Some("u64, bool"));
        assert_eq!(delimited("{ unclosed"), None);
    }

    #[test]
    fn tuple_elements_respect_nesting() {
        assert_eq!(
            tuple_elements("(u64, Table<address, u64>)"),
            Some(vec!["u64".to_string(), "Table<address, u64>".to_string()])
        );
        assert_eq!(tuple_elements("()"), Some(Vec::new()));
        assert_eq!(tuple_elements("u64"), None);
    }
}
