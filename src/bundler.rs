use jsonc_parser::ParseOptions;
use jsonc_parser::parse_to_serde_value;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use swc_common::{FileName, SourceMap, sync::Lrc};
use swc_ecma_ast::{
    BlockStmtOrExpr, Callee, Decl, Expr, Lit, MemberProp, Module, ModuleDecl, ModuleItem,
    ObjectLit, Pat, Prop, PropName, PropOrSpread, Stmt,
};
use swc_ecma_parser::{EsConfig, Parser as SwcParser, StringInput, Syntax, TsConfig};
use vfs::VfsPath;

use crate::project::{join, normalize};
use crate::{AliasMap, LogLevel, Logger};

const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "ts", "mts", "cts"];

fn parse_module(src: &str, ext: &str, file: FileName) -> anyhow::Result<Module> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(file, src.into());
    let syntax = match ext {
        "ts" | "mts" | "cts" => Syntax::Typescript(TsConfig::default()),
        _ => Syntax::Es(EsConfig::default()),
    };
    let mut parser = SwcParser::new(syntax, StringInput::from(&*fm), None);
    parser
        .parse_module()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))
}

/// Read the `resolve.alias` table out of a bundler config without running it.
///
/// `rel_path` is relative to the project root. Values in the result are
/// either root-relative or absolute host paths. Any failure yields `None`.
pub fn load_bundler_alias(root: &VfsPath, rel_path: &str, logger: &dyn Logger) -> Option<AliasMap> {
    match try_load(root, rel_path) {
        Ok(Some(alias)) => {
            logger.log(
                LogLevel::Debug,
                &format!("read {} aliases from {rel_path}", alias.len()),
            );
            Some(alias)
        }
        Ok(None) => {
            logger.log(
                LogLevel::Debug,
                &format!("no resolve.alias found in {rel_path}"),
            );
            None
        }
        Err(e) => {
            logger.log(
                LogLevel::Debug,
                &format!("failed to load bundler config {rel_path}: {e}"),
            );
            None
        }
    }
}

fn try_load(root: &VfsPath, rel_path: &str) -> anyhow::Result<Option<AliasMap>> {
    let path = join(root, rel_path)?;
    let src = path.read_to_string()?;
    let config_dir = Path::new(&normalize(rel_path))
        .parent()
        .map(|p| normalize(&p.to_string_lossy()))
        .unwrap_or_else(|| ".".to_string());
    let ext = Path::new(rel_path)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    if ext == "json" {
        let value = parse_to_serde_value(&src, &ParseOptions::default())
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        return Ok(value.and_then(|v| alias_from_json(&v, &config_dir)));
    }
    if !SCRIPT_EXTENSIONS.contains(&ext) {
        anyhow::bail!("unsupported bundler config extension: {ext}");
    }
    let module = parse_module(&src, ext, FileName::Custom(rel_path.into()))?;
    Ok(alias_from_module(&module, &config_dir))
}

fn alias_from_json(value: &Value, config_dir: &str) -> Option<AliasMap> {
    let table = value.get("resolve")?.get("alias")?.as_object()?;
    let alias: AliasMap = table
        .iter()
        .filter_map(|(k, v)| Some((k.clone(), literal_path(v.as_str()?, config_dir))))
        .collect();
    Some(alias)
}

fn alias_from_module(module: &Module, config_dir: &str) -> Option<AliasMap> {
    let mut bindings: HashMap<String, &Expr> = HashMap::new();
    let mut exported: Vec<&Expr> = Vec::new();
    for item in &module.body {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => {
                exported.push(&export.expr);
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                collect_bindings(&export.decl, &mut bindings);
            }
            ModuleItem::Stmt(Stmt::Decl(decl)) => collect_bindings(decl, &mut bindings),
            ModuleItem::Stmt(Stmt::Expr(stmt)) => {
                if let Expr::Assign(assign) = &*stmt.expr {
                    exported.push(&assign.right);
                }
            }
            _ => {}
        }
    }
    // Exported expressions first, then any top-level binding that looks like a config.
    let bound: Vec<&Expr> = bindings.values().copied().collect();
    for expr in exported.into_iter().chain(bound) {
        let Some(config) = config_object(expr, &bindings) else {
            continue;
        };
        if let Some(alias) = alias_from_config(config, config_dir) {
            return Some(alias);
        }
    }
    None
}

fn collect_bindings<'a>(decl: &'a Decl, bindings: &mut HashMap<String, &'a Expr>) {
    let Decl::Var(var) = decl else {
        return;
    };
    for d in &var.decls {
        if let (Pat::Ident(name), Some(init)) = (&d.name, &d.init) {
            bindings.insert(name.id.sym.to_string(), init);
        }
    }
}

/// Unwrap `defineConfig(...)`, arrow bodies, parens and type assertions down
/// to the object literal holding the config.
fn config_object<'a>(expr: &'a Expr, bindings: &HashMap<String, &'a Expr>) -> Option<&'a ObjectLit> {
    match expr {
        Expr::Object(obj) => Some(obj),
        Expr::Paren(p) => config_object(&p.expr, bindings),
        Expr::TsAs(e) => config_object(&e.expr, bindings),
        Expr::TsSatisfies(e) => config_object(&e.expr, bindings),
        Expr::Call(call) => {
            let first = call.args.first()?;
            config_object(&first.expr, bindings)
        }
        Expr::Arrow(arrow) => match &*arrow.body {
            BlockStmtOrExpr::Expr(body) => config_object(body, bindings),
            _ => None,
        },
        Expr::Ident(ident) => {
            let target = *bindings.get(&*ident.sym)?;
            // Guard against `const a = a`.
            if matches!(target, Expr::Ident(t) if t.sym == ident.sym) {
                return None;
            }
            config_object(target, bindings)
        }
        _ => None,
    }
}

fn prop_name(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        _ => None,
    }
}

fn get_prop<'a>(obj: &'a ObjectLit, key: &str) -> Option<&'a Expr> {
    obj.props.iter().find_map(|p| match p {
        PropOrSpread::Prop(prop) => match &**prop {
            Prop::KeyValue(kv) if prop_name(&kv.key).as_deref() == Some(key) => Some(&*kv.value),
            _ => None,
        },
        _ => None,
    })
}

fn alias_from_config(config: &ObjectLit, config_dir: &str) -> Option<AliasMap> {
    let Expr::Object(resolve) = get_prop(config, "resolve")? else {
        return None;
    };
    let mut alias = AliasMap::new();
    match get_prop(resolve, "alias")? {
        Expr::Object(table) => {
            for p in &table.props {
                let PropOrSpread::Prop(prop) = p else {
                    continue;
                };
                let Prop::KeyValue(kv) = &**prop else {
                    continue;
                };
                let Some(key) = prop_name(&kv.key) else {
                    continue;
                };
                // `name$` is an exact-match module alias, not a path root.
                if key.ends_with('$') {
                    continue;
                }
                if let Some(value) = eval_path(&kv.value, config_dir) {
                    alias.insert(key, value);
                }
            }
        }
        Expr::Array(list) => {
            for elem in list.elems.iter().flatten() {
                let Expr::Object(entry) = &*elem.expr else {
                    continue;
                };
                let (Some(find), Some(replacement)) =
                    (get_prop(entry, "find"), get_prop(entry, "replacement"))
                else {
                    continue;
                };
                let (Some(key), Some(value)) = (string_value(find), eval_path(replacement, config_dir))
                else {
                    continue;
                };
                alias.insert(key, value);
            }
        }
        _ => return None,
    }
    Some(alias)
}

fn string_value(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => {
            let quasi = tpl.quasis.first()?;
            Some(
                quasi
                    .cooked
                    .as_ref()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| quasi.raw.to_string()),
            )
        }
        Expr::Paren(p) => string_value(&p.expr),
        _ => None,
    }
}

fn literal_path(value: &str, config_dir: &str) -> String {
    if Path::new(value).is_absolute() {
        value.to_string()
    } else {
        normalize(&format!("{config_dir}/{value}"))
    }
}

fn callee_name(callee: &Callee) -> Option<String> {
    let Callee::Expr(expr) = callee else {
        return None;
    };
    match &**expr {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::Member(member) => match &member.prop {
            MemberProp::Ident(ident) => Some(ident.sym.to_string()),
            _ => None,
        },
        _ => None,
    }
}

/// One argument of `path.resolve`/`path.join`.
fn segment(expr: &Expr, config_dir: &str) -> Option<String> {
    match expr {
        Expr::Ident(ident) if &*ident.sym == "__dirname" => Some(config_dir.to_string()),
        Expr::Call(call) if callee_name(&call.callee).as_deref() == Some("cwd") => {
            Some(".".to_string())
        }
        _ => string_value(expr),
    }
}

fn eval_path(expr: &Expr, config_dir: &str) -> Option<String> {
    match expr {
        Expr::Call(call) => match callee_name(&call.callee)?.as_str() {
            "resolve" | "join" => {
                let mut acc = String::from(".");
                for arg in &call.args {
                    let seg = segment(&arg.expr, config_dir)?;
                    if Path::new(&seg).is_absolute() {
                        acc = seg;
                    } else {
                        acc = format!("{acc}/{seg}");
                    }
                }
                if Path::new(&acc).is_absolute() {
                    Some(acc)
                } else {
                    Some(normalize(&acc))
                }
            }
            "fileURLToPath" => {
                let Expr::New(url) = &*call.args.first()?.expr else {
                    return None;
                };
                let first = url.args.as_ref()?.first()?;
                Some(literal_path(&string_value(&first.expr)?, config_dir))
            }
            _ => None,
        },
        _ => Some(literal_path(&string_value(expr)?, config_dir)),
    }
}
