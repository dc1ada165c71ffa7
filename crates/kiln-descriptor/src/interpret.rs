//! Kotlin-DSL interpretation
//!
//! Walks the syntax tree of a build script and builds the descriptor model.
//! `plugins { }` blocks are applied before anything else so that later
//! statements can configure the tasks those plugins register.

use crate::codes;
use crate::lifecycle;
use crate::model::{
    is_repository_url, simple_type_name, Coordinate, Dependency, Descriptor, Plugin, Repository,
    Scope, Task, TaskKind, TestLogEvent, TestRunner, TestSettings, Value,
};
use kiln_syntax::{Block, Call, Diagnostic, Expr, Literal, Script, Span, Stmt, StringPart, ValDecl, ValInit};
use std::collections::HashMap;
use tracing::debug;

/// Builds a [`Descriptor`] from a parsed script
pub(crate) struct Interpreter {
    strict: bool,
    descriptor: Descriptor,
    diagnostics: Vec<Diagnostic>,
    /// `val name = "..."` declarations usable in string templates
    variables: HashMap<String, String>,
    /// `tasks.withType<T> { }` rules, applied to tasks registered later
    type_rules: Vec<(String, Block)>,
    custom_repositories: usize,
}

impl Interpreter {
    pub(crate) fn new(strict: bool) -> Self {
        Self {
            strict,
            descriptor: Descriptor::default(),
            diagnostics: Vec::new(),
            variables: HashMap::new(),
            type_rules: Vec::new(),
            custom_repositories: 0,
        }
    }

    pub(crate) fn interpret(mut self, script: &Script) -> (Descriptor, Vec<Diagnostic>) {
        for stmt in &script.statements {
            if let Some(block) = block_call(stmt, "plugins") {
                self.plugins_block(block);
            }
        }

        for stmt in &script.statements {
            if block_call(stmt, "plugins").is_none() {
                self.top_level(stmt);
            }
        }

        (self.descriptor, self.diagnostics)
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn error(&mut self, code: &str, message: impl Into<String>, span: Span) {
        self.report(Diagnostic::error_with_code(code, message, span));
    }

    /// Statement the loader does not model: warning, or error in strict mode
    fn unsupported(&mut self, what: impl std::fmt::Display, span: Span) {
        let diagnostic = if self.strict {
            Diagnostic::error_with_code(
                codes::UNSUPPORTED_STATEMENT,
                format!("Unsupported {} in strict mode", what),
                span,
            )
            .with_help("remove the statement or load the descriptor without --strict")
        } else {
            Diagnostic::warning_with_code(
                codes::IGNORED_STATEMENT,
                format!("Ignoring unsupported {}", what),
                span,
            )
        };
        self.report(diagnostic);
    }

    // ------------------------------------------------------------------------
    // Top level
    // ------------------------------------------------------------------------

    fn top_level(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Val(decl) => self.val_decl(decl, false),
            Stmt::Assign {
                target,
                value,
                span,
            } => self.project_assign(target, value, *span),
            Stmt::Expr(Expr::Call(call)) => self.top_level_call(call),
            other => self.unsupported("statement", other.span()),
        }
    }

    fn top_level_call(&mut self, call: &Call) {
        let path = call.callee_path();
        let no_args = call.args.is_empty();

        match (path.as_deref(), &call.lambda) {
            (Some("repositories"), Some(block)) if no_args => self.repositories_block(block),
            (Some("dependencies"), Some(block)) if no_args => self.dependencies_block(block),
            (Some("java"), Some(block)) if no_args => self.java_block(block),
            (Some("tasks"), Some(block)) if no_args => self.tasks_block(block),
            (Some("apply"), None) => self.apply_plugin(call),
            _ if is_tasks_receiver(call) => self.task_container_call(call),
            _ => self.unsupported(format!("block '{}'", call.callee), call.span),
        }
    }

    fn project_assign(&mut self, target: &Expr, value: &Expr, span: Span) {
        match target.path().as_deref() {
            Some(name @ ("group" | "version" | "description")) => {
                let Some(text) = self.string_value(value) else {
                    return;
                };
                let project = &mut self.descriptor.project;
                match name {
                    "group" => project.group = Some(text),
                    "version" => project.version = Some(text),
                    _ => project.description = Some(text),
                }
            }
            _ => self.unsupported(format!("assignment to '{}'", target), span),
        }
    }

    fn val_decl(&mut self, decl: &ValDecl, in_tasks_block: bool) {
        let name = decl.name.name.as_str();
        match &decl.init {
            ValInit::Value(expr @ (Expr::Literal(Literal::String(_), _) | Expr::Ident(_))) => {
                if let Some(text) = self.string_value(expr) {
                    self.variables.insert(name.to_string(), text);
                }
            }
            ValInit::Value(Expr::Literal(Literal::Number(n), _)) => {
                self.variables.insert(name.to_string(), n.clone());
            }
            ValInit::Delegate(Expr::Call(call))
                if (in_tasks_block && call.receiver().is_none()) || is_tasks_receiver(call) =>
            {
                match call.callee_name() {
                    Some("creating" | "registering") => {
                        self.register_task(name, task_type_of(call), call.lambda.as_ref());
                    }
                    Some("getting" | "existing") => {
                        self.configure_named(name, call.lambda.as_ref(), decl.span);
                    }
                    _ => self.unsupported(format!("delegate for 'val {}'", name), decl.span),
                }
            }
            _ => self.unsupported(format!("declaration 'val {}'", name), decl.span),
        }
    }

    // ------------------------------------------------------------------------
    // Plugins
    // ------------------------------------------------------------------------

    fn plugins_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            let result = match stmt {
                Stmt::Expr(expr) => plugin_from_expr(expr),
                other => Err(format!("expected a plugin declaration, found '{}'", stmt_head(other))),
            };
            match result {
                Ok(plugin) => self.add_plugin(plugin),
                Err(message) => self.report(
                    Diagnostic::error_with_code(
                        codes::INVALID_PLUGIN,
                        format!("Invalid plugin declaration: {}", message),
                        stmt.span(),
                    )
                    .with_help("declare plugins as `java`, `id(\"...\")` or `id(\"...\") version \"...\"`"),
                ),
            }
        }
    }

    /// `apply(plugin = "scala")`
    fn apply_plugin(&mut self, call: &Call) {
        match call.named("plugin").and_then(Expr::as_plain_string) {
            Some(id) => self.add_plugin(Plugin::new(id)),
            None => self.error(
                codes::INVALID_PLUGIN,
                "apply() expects a `plugin = \"id\"` argument",
                call.span,
            ),
        }
    }

    fn add_plugin(&mut self, plugin: Plugin) {
        debug!(id = %plugin.id, version = ?plugin.version, apply = plugin.apply, "declaring plugin");
        let id = plugin.id.clone();
        let apply = plugin.apply;
        self.descriptor.plugins.push(plugin);

        if apply && lifecycle::is_lifecycle_plugin(&id) {
            let added = lifecycle::register_builtin_tasks(&id, &mut self.descriptor.tasks);
            for name in added {
                self.apply_type_rules(&name);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Repositories
    // ------------------------------------------------------------------------

    fn repositories_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            let Stmt::Expr(Expr::Call(call)) = stmt else {
                self.error(
                    codes::INVALID_REPOSITORY,
                    format!("Expected a repository declaration, found '{}'", stmt_head(stmt)),
                    stmt.span(),
                );
                continue;
            };

            match call.callee_path().as_deref() {
                Some("maven") => self.maven_repository(call),
                Some(shorthand) => match Repository::from_shorthand(shorthand) {
                    Some(repository) if call.args.is_empty() => {
                        self.descriptor.repositories.push(repository)
                    }
                    _ => self.report(
                        Diagnostic::error_with_code(
                            codes::INVALID_REPOSITORY,
                            format!("Unknown repository '{}'", shorthand),
                            call.span,
                        )
                        .with_help(
                            "use mavenCentral(), google(), mavenLocal(), gradlePluginPortal() or maven(\"<url>\")",
                        ),
                    ),
                },
                None => self.error(
                    codes::INVALID_REPOSITORY,
                    format!("Unsupported repository declaration '{}'", call.callee),
                    call.span,
                ),
            }
        }
    }

    /// `maven("url")`, `maven(url = "url")` or `maven { url = uri("url"); name = "n" }`
    fn maven_repository(&mut self, call: &Call) {
        let mut url = None;
        let mut name = None;

        if let Some(arg) = call.positional().next().or_else(|| call.named("url")) {
            url = self.url_value(arg);
            if url.is_none() {
                return;
            }
        }

        if let Some(block) = &call.lambda {
            for stmt in &block.statements {
                match stmt {
                    Stmt::Assign { target, value, .. } => match target.path().as_deref() {
                        Some("url") => url = self.url_value(value),
                        Some("name") => name = self.string_value(value),
                        _ => self.unsupported(format!("repository setting '{}'", target), stmt.span()),
                    },
                    Stmt::Expr(Expr::Call(inner))
                        if inner.callee_path().as_deref() == Some("setUrl") =>
                    {
                        url = inner.positional().next().and_then(|arg| self.url_value(arg));
                    }
                    other => self.unsupported("repository setting", other.span()),
                }
            }
        }

        let Some(url) = url else {
            self.error(
                codes::INVALID_REPOSITORY,
                "maven repository declared without a url",
                call.span,
            );
            return;
        };
        if !is_repository_url(&url) {
            self.error(
                codes::INVALID_REPOSITORY,
                format!("'{}' is not a repository URL", url),
                call.span,
            );
            return;
        }

        let name = match name {
            Some(name) => name,
            None => {
                self.custom_repositories += 1;
                match self.custom_repositories {
                    1 => "maven".to_string(),
                    n => format!("maven{}", n),
                }
            }
        };
        self.descriptor.repositories.push(Repository::new(name, url));
    }

    fn url_value(&mut self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Call(call) if call.callee_path().as_deref() == Some("uri") => {
                match call.positional().next() {
                    Some(arg) => self.string_value(arg),
                    None => {
                        self.error(codes::INVALID_VALUE, "uri() expects a string argument", call.span);
                        None
                    }
                }
            }
            other => self.string_value(other),
        }
    }

    // ------------------------------------------------------------------------
    // Dependencies
    // ------------------------------------------------------------------------

    fn dependencies_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            let Stmt::Expr(Expr::Call(call)) = stmt else {
                self.error(
                    codes::UNSUPPORTED_NOTATION,
                    format!("Expected a dependency declaration, found '{}'", stmt_head(stmt)),
                    stmt.span(),
                );
                continue;
            };

            let Expr::Ident(configuration) = call.callee.as_ref() else {
                self.error(
                    codes::UNSUPPORTED_NOTATION,
                    format!("Unsupported dependency declaration '{}'", call.callee),
                    call.span,
                );
                continue;
            };

            let Some(scope) = Scope::from_configuration(&configuration.name) else {
                self.report(
                    Diagnostic::error_with_code(
                        codes::UNKNOWN_CONFIGURATION,
                        format!("Unknown dependency configuration '{}'", configuration.name),
                        configuration.span,
                    )
                    .with_label("unknown configuration")
                    .with_help("supported configurations: implementation, api, testImplementation, testRuntimeOnly"),
                );
                continue;
            };

            let Some(coordinate) = self.coordinate(call) else {
                continue;
            };

            if let Some(block) = &call.lambda {
                self.unsupported(format!("configuration block for '{}'", coordinate), block.span);
            }

            let dependency = Dependency::new(coordinate, scope);
            if self.descriptor.dependencies.contains(&dependency) {
                self.report(Diagnostic::warning_with_code(
                    codes::DUPLICATE_DEPENDENCY_DECLARATION,
                    format!(
                        "Dependency '{}' is already declared in '{}'",
                        dependency.coordinate, scope
                    ),
                    call.span,
                ));
                continue;
            }

            debug!(coordinate = %dependency.coordinate, scope = scope.tag(), "declaring dependency");
            self.descriptor.dependencies.push(dependency);
        }
    }

    /// `"g:a:v"` or `group = "g", name = "a", version = "v"`
    fn coordinate(&mut self, call: &Call) -> Option<Coordinate> {
        let all_named = !call.args.is_empty() && call.args.iter().all(|a| a.name.is_some());

        let (text, result) = match call.args.as_slice() {
            [arg] if arg.name.is_none() && matches!(arg.value, Expr::Literal(Literal::String(_), _)) => {
                let text = self.string_value(&arg.value)?;
                let result = Coordinate::parse(&text);
                (text, result)
            }
            _ if all_named => {
                if let Some(unknown) = call
                    .args
                    .iter()
                    .filter_map(|a| a.name.as_ref())
                    .find(|n| !matches!(n.name.as_str(), "group" | "name" | "version"))
                {
                    self.error(
                        codes::UNSUPPORTED_NOTATION,
                        format!("Unsupported dependency argument '{}'", unknown.name),
                        unknown.span,
                    );
                    return None;
                }

                let mut parts = [String::new(), String::new(), String::new()];
                for (slot, key) in parts.iter_mut().zip(["group", "name", "version"]) {
                    if let Some(expr) = call.named(key) {
                        *slot = self.string_value(expr)?;
                    }
                }
                let [group, artifact, version] = parts;
                let text = format!("{}:{}:{}", group, artifact, version);
                (text, Coordinate::new(group, artifact, version))
            }
            _ => {
                self.report(
                    Diagnostic::error_with_code(
                        codes::UNSUPPORTED_NOTATION,
                        format!("Unsupported dependency notation '{}'", Expr::Call(call.clone())),
                        call.span,
                    )
                    .with_help("declare dependencies as \"group:artifact:version\""),
                );
                return None;
            }
        };

        match result {
            Ok(coordinate) => Some(coordinate),
            Err(e) => {
                self.report(
                    Diagnostic::error_with_code(
                        codes::INVALID_COORDINATE,
                        format!("Invalid dependency coordinate '{}': {}", text, e),
                        call.span,
                    )
                    .with_help("coordinates are written 'group:artifact:version'"),
                );
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // java { }
    // ------------------------------------------------------------------------

    fn java_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            match stmt {
                Stmt::Expr(Expr::Call(call)) if call.args.is_empty() && call.lambda.is_none() => {
                    match call.callee_path().as_deref() {
                        Some("withSourcesJar") => {
                            self.archive_task("sourcesJar", "sources", "sourceSets.main.allSource", call.span)
                        }
                        Some("withJavadocJar") => {
                            self.archive_task("javadocJar", "javadoc", "javadoc", call.span)
                        }
                        _ => self.unsupported(format!("java setting '{}'", call.callee), call.span),
                    }
                }
                other => self.unsupported("java setting", other.span()),
            }
        }
    }

    /// Extra jar published next to the main one and built by `assemble`
    fn archive_task(&mut self, name: &str, classifier: &str, input: &str, span: Span) {
        if !self.descriptor.has_task("assemble") {
            self.report(
                Diagnostic::error_with_code(
                    codes::MISSING_JAVA_PLUGIN,
                    format!("'{}' requires the java plugin", name),
                    span,
                )
                .with_help("apply `java`, `java-library` or `scala` in the plugins block"),
            );
            return;
        }
        if self.descriptor.has_task(name) {
            self.error(
                codes::DUPLICATE_REGISTRATION,
                format!("Task '{}' is already registered", name),
                span,
            );
            return;
        }

        let mut task = Task::new(name, TaskKind::Builtin, Some("Jar".to_string()));
        task.group = Some("documentation".to_string());
        task.inputs.push(input.to_string());
        task.options.insert(
            "archiveClassifier".to_string(),
            Value::String(classifier.to_string()),
        );
        if self.descriptor.has_task(input) {
            task.add_dependency(input);
        }
        self.descriptor.tasks.push(task);
        self.apply_type_rules(name);

        if let Some(assemble) = self.descriptor.task_mut("assemble") {
            assemble.add_dependency(name);
        }
    }

    // ------------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------------

    fn tasks_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            match stmt {
                Stmt::Val(decl) => self.val_decl(decl, true),
                Stmt::Expr(Expr::Call(call)) if call.receiver().is_none() => {
                    self.task_container_call(call)
                }
                other => self.unsupported("statement in tasks block", other.span()),
            }
        }
    }

    /// `register`, `named`, `withType` or `<name> { }` on the task container
    fn task_container_call(&mut self, call: &Call) {
        let Some(method) = call.callee_name() else {
            self.unsupported(format!("task call '{}'", call.callee), call.span);
            return;
        };

        match method {
            "register" | "create" => {
                if let Some(name) = self.task_name_arg(call) {
                    if self.descriptor.has_task(&name) {
                        self.duplicate_task(&name, call.span);
                    } else {
                        self.register_task(&name, task_type_of(call), call.lambda.as_ref());
                    }
                }
            }
            "named" | "getByName" => {
                if let Some(name) = self.task_name_arg(call) {
                    self.configure_named(&name, call.lambda.as_ref(), call.span);
                }
            }
            "withType" => match (task_type_of(call), &call.lambda) {
                (Some(task_type), Some(body)) => self.add_type_rule(task_type, body),
                (None, _) => self.error(
                    codes::INVALID_VALUE,
                    "withType expects a task type such as withType<Test>",
                    call.span,
                ),
                (Some(_), None) => self.unsupported("withType without a configuration block", call.span),
            },
            name if call.args.is_empty() && call.type_args.is_empty() => {
                self.configure_named(name, call.lambda.as_ref(), call.span)
            }
            other => self.unsupported(format!("task container call '{}'", other), call.span),
        }
    }

    fn duplicate_task(&mut self, name: &str, span: Span) {
        let mut diagnostic = Diagnostic::error_with_code(
            codes::DUPLICATE_REGISTRATION,
            format!("Task '{}' is already registered", name),
            span,
        )
        .with_help(format!("use tasks.named(\"{}\") to configure the existing task", name));
        if self.descriptor.task(name).is_some_and(|t| t.kind == TaskKind::Builtin) {
            diagnostic = diagnostic.with_note(format!("'{}' is a built-in task of an applied plugin", name));
        }
        self.report(diagnostic);
    }

    fn register_task(&mut self, name: &str, task_type: Option<String>, body: Option<&Block>) {
        if self.descriptor.has_task(name) {
            let span = body.map(|b| b.span).unwrap_or_else(Span::dummy);
            self.duplicate_task(name, span);
            return;
        }

        debug!(task = name, task_type = ?task_type, "registering task");
        self.descriptor
            .tasks
            .push(Task::new(name, TaskKind::Custom, task_type));
        self.apply_type_rules(name);

        if let Some(body) = body {
            self.configure_task(name, body);
        }
    }

    fn configure_named(&mut self, name: &str, body: Option<&Block>, span: Span) {
        if !self.descriptor.has_task(name) {
            self.report(
                Diagnostic::error_with_code(
                    codes::UNKNOWN_TASK,
                    format!("Unknown task '{}'", name),
                    span,
                )
                .with_help("tasks must be registered by a plugin or tasks.register(...) before they are configured"),
            );
            return;
        }
        if let Some(body) = body {
            self.configure_task(name, body);
        }
    }

    fn add_type_rule(&mut self, task_type: String, body: &Block) {
        let matching: Vec<String> = self
            .descriptor
            .tasks
            .iter()
            .filter(|t| t.is_type(&task_type))
            .map(|t| t.name.clone())
            .collect();
        for name in matching {
            self.configure_task(&name, body);
        }
        self.type_rules.push((task_type, body.clone()));
    }

    fn apply_type_rules(&mut self, name: &str) {
        let Some(task_type) = self.descriptor.task(name).and_then(|t| t.task_type.clone()) else {
            return;
        };
        let rules: Vec<Block> = self
            .type_rules
            .iter()
            .filter(|(rule_type, _)| *rule_type == task_type)
            .map(|(_, body)| body.clone())
            .collect();
        for body in &rules {
            self.configure_task(name, body);
        }
    }

    fn task_name_arg(&mut self, call: &Call) -> Option<String> {
        match call.positional().next() {
            Some(arg) => self.string_value(arg),
            None => {
                self.error(
                    codes::INVALID_VALUE,
                    format!("'{}' expects a task name", call.callee),
                    call.span,
                );
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Task bodies
    // ------------------------------------------------------------------------

    fn configure_task(&mut self, name: &str, body: &Block) {
        for stmt in &body.statements {
            match stmt {
                Stmt::Expr(Expr::Call(call)) => self.task_call(name, call),
                Stmt::Assign {
                    target,
                    value,
                    span,
                } => self.task_assign(name, target, value, *span),
                other => self.unsupported(format!("statement in task '{}'", name), other.span()),
            }
        }
    }

    fn task_call(&mut self, name: &str, call: &Call) {
        let method = call.callee_path();
        match method.as_deref() {
            Some(edge @ ("dependsOn" | "mustRunAfter")) => {
                let targets: Vec<String> = call
                    .positional()
                    .filter_map(|arg| self.task_reference(arg))
                    .collect();
                if let Some(task) = self.descriptor.task_mut(name) {
                    for target in targets {
                        if edge == "dependsOn" {
                            task.add_dependency(target);
                        } else {
                            task.add_must_run_after(target);
                        }
                    }
                }
            }
            Some("from") => {
                let inputs: Vec<String> = call
                    .positional()
                    .filter_map(|arg| match arg {
                        Expr::Literal(Literal::String(_), _) => self.string_value(arg),
                        other => Some(other.to_string()),
                    })
                    .collect();
                if let Some(task) = self.descriptor.task_mut(name) {
                    task.inputs.extend(inputs);
                }
            }
            Some(kind @ ("include" | "exclude")) => {
                let patterns: Vec<String> = call
                    .positional()
                    .filter_map(|arg| self.string_value(arg))
                    .collect();
                self.add_patterns(name, kind == "include", patterns);
            }
            Some(runner @ ("useJUnitPlatform" | "useJUnit" | "useTestNG")) => {
                if let Some(block) = &call.lambda {
                    self.unsupported(format!("options for {}", runner), block.span);
                }
                let runner = match runner {
                    "useJUnitPlatform" => TestRunner::JUnitPlatform,
                    "useJUnit" => TestRunner::JUnit,
                    _ => TestRunner::TestNG,
                };
                if let Some(test) = self.test_settings(name, "test framework", call.span) {
                    test.runner = runner;
                }
            }
            Some("testLogging") => self.test_logging(name, call),
            Some(action @ ("doFirst" | "doLast")) => {
                self.unsupported(format!("task action '{}'", action), call.span)
            }
            Some(path) if path.ends_with(".set") && call.args.len() == 1 => {
                let property = path.trim_end_matches(".set").to_string();
                if let Some(value) = self.option_value(&call.args[0].value) {
                    if let Some(task) = self.descriptor.task_mut(name) {
                        task.options.insert(property, value);
                    }
                }
            }
            _ => self.unsupported(format!("task call '{}'", call.callee), call.span),
        }
    }

    fn task_assign(&mut self, name: &str, target: &Expr, value: &Expr, span: Span) {
        let Some(path) = target.path() else {
            self.unsupported(format!("assignment to '{}'", target), span);
            return;
        };

        match path.as_str() {
            "group" | "description" => {
                let Some(text) = self.string_value(value) else {
                    return;
                };
                if let Some(task) = self.descriptor.task_mut(name) {
                    if path == "group" {
                        task.group = Some(text);
                    } else {
                        task.description = Some(text);
                    }
                }
            }
            "isScanForTestClasses" => {
                let Expr::Literal(Literal::Bool(scan), _) = value else {
                    self.error(
                        codes::INVALID_VALUE,
                        format!("isScanForTestClasses expects true or false, found {}", value),
                        value.span(),
                    );
                    return;
                };
                if let Some(test) = self.test_settings(name, "isScanForTestClasses", span) {
                    test.scan_for_test_classes = *scan;
                }
            }
            _ => {
                if let Some(value) = self.option_value(value) {
                    if let Some(task) = self.descriptor.task_mut(name) {
                        task.options.insert(path, value);
                    }
                }
            }
        }
    }

    fn add_patterns(&mut self, name: &str, include: bool, patterns: Vec<String>) {
        let Some(task) = self.descriptor.task_mut(name) else {
            return;
        };
        match task.test.as_mut() {
            Some(test) if include => test.includes.extend(patterns),
            Some(test) => test.excludes.extend(patterns),
            None => {
                let key = if include { "includes" } else { "excludes" };
                let entry = task
                    .options
                    .entry(key.to_string())
                    .or_insert_with(|| Value::List(Vec::new()));
                if let Value::List(items) = entry {
                    items.extend(patterns.into_iter().map(Value::String));
                }
            }
        }
    }

    fn test_logging(&mut self, name: &str, call: &Call) {
        let Some(block) = &call.lambda else {
            self.unsupported("testLogging without a configuration block", call.span);
            return;
        };

        let mut events = Vec::new();
        for stmt in &block.statements {
            let args: Vec<&Expr> = match stmt {
                Stmt::Expr(Expr::Call(inner)) if inner.callee_path().as_deref() == Some("events") => {
                    inner.positional().collect()
                }
                Stmt::Assign { target, value, .. } if target.path().as_deref() == Some("events") => {
                    match value.as_call() {
                        Some(set) if set.callee_path().as_deref() == Some("setOf") => {
                            set.positional().collect()
                        }
                        _ => vec![value],
                    }
                }
                other => {
                    self.unsupported("testLogging setting", other.span());
                    continue;
                }
            };

            for arg in args {
                if let Some(event) = self.test_event(arg) {
                    if !events.contains(&event) {
                        events.push(event);
                    }
                }
            }
        }

        if let Some(test) = self.test_settings(name, "testLogging", call.span) {
            for event in events {
                if !test.events.contains(&event) {
                    test.events.push(event);
                }
            }
        }
    }

    fn test_event(&mut self, arg: &Expr) -> Option<TestLogEvent> {
        let text = match arg {
            Expr::Literal(Literal::String(_), _) => self.string_value(arg)?,
            Expr::Ident(ident) => ident.name.clone(),
            Expr::Member { .. } => arg.to_string(),
            other => {
                self.error(
                    codes::INVALID_VALUE,
                    format!("Expected a test logging event, found {}", other),
                    other.span(),
                );
                return None;
            }
        };

        match text.parse::<TestLogEvent>() {
            Ok(event) => Some(event),
            Err(message) => {
                self.report(
                    Diagnostic::error_with_code(codes::UNKNOWN_TEST_EVENT, message, arg.span())
                        .with_help("expected one of started, passed, skipped, failed, standard_out, standard_error"),
                );
                None
            }
        }
    }

    /// Test settings of a `Test` task; reports an error for any other task
    fn test_settings(&mut self, name: &str, what: &str, span: Span) -> Option<&mut TestSettings> {
        let is_test = self
            .descriptor
            .task(name)
            .is_some_and(|t| t.test.is_some());
        if !is_test {
            self.error(
                codes::INVALID_VALUE,
                format!("{} is only available on Test tasks, and '{}' is not one", what, name),
                span,
            );
            return None;
        }
        self.descriptor.task_mut(name).and_then(|t| t.test.as_mut())
    }

    fn task_reference(&mut self, arg: &Expr) -> Option<String> {
        match arg {
            Expr::Literal(Literal::String(_), _) => self
                .string_value(arg)
                .map(|s| s.trim_start_matches(':').to_string()),
            Expr::Ident(ident) => Some(
                self.variables
                    .get(&ident.name)
                    .cloned()
                    .unwrap_or_else(|| ident.name.clone()),
            ),
            Expr::Member { receiver, name, .. } if receiver.path().as_deref() == Some("tasks") => {
                Some(name.name.clone())
            }
            Expr::Call(call) if call.callee_path().as_deref() == Some("tasks.named") => {
                self.task_name_arg(call)
            }
            other => {
                self.error(
                    codes::INVALID_VALUE,
                    format!("Cannot use {} as a task reference", other),
                    other.span(),
                );
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------------

    /// String literal (templates resolved) or a string variable
    fn string_value(&mut self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Literal(Literal::String(parts), span) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        StringPart::Text(text) => out.push_str(text),
                        StringPart::Var(var) => match self.variable(var) {
                            Some(value) => out.push_str(&value),
                            None => {
                                self.undefined_variable(var, *span);
                                return None;
                            }
                        },
                    }
                }
                Some(out)
            }
            Expr::Ident(ident) => match self.variable(&ident.name) {
                Some(value) => Some(value),
                None => {
                    self.undefined_variable(&ident.name, ident.span);
                    None
                }
            },
            other => {
                self.error(
                    codes::INVALID_VALUE,
                    format!("Expected a string, found {}", other),
                    other.span(),
                );
                None
            }
        }
    }

    /// A `val`, or else a project property assigned earlier
    fn variable(&self, name: &str) -> Option<String> {
        if let Some(value) = self.variables.get(name) {
            return Some(value.clone());
        }
        let project = &self.descriptor.project;
        match name {
            "group" => project.group.clone(),
            "version" => project.version.clone(),
            "description" => project.description.clone(),
            _ => None,
        }
    }

    fn undefined_variable(&mut self, name: &str, span: Span) {
        self.report(
            Diagnostic::error_with_code(
                codes::UNDEFINED_VARIABLE,
                format!("Undefined variable '{}'", name),
                span,
            )
            .with_help(format!("declare it first: val {} = \"...\"", name)),
        );
    }

    /// Free-form task option value
    fn option_value(&mut self, expr: &Expr) -> Option<Value> {
        match expr {
            Expr::Literal(Literal::String(_), _) => self.string_value(expr).map(Value::String),
            Expr::Literal(Literal::Number(n), _) => Some(
                n.parse::<i64>()
                    .map(Value::Integer)
                    .unwrap_or_else(|_| Value::String(n.clone())),
            ),
            Expr::Literal(Literal::Bool(b), _) => Some(Value::Bool(*b)),
            Expr::Call(call)
                if call.lambda.is_none()
                    && matches!(call.callee_path().as_deref(), Some("listOf" | "setOf" | "arrayOf")) =>
            {
                let mut items = Vec::new();
                for arg in call.positional() {
                    items.push(self.option_value(arg)?);
                }
                Some(Value::List(items))
            }
            Expr::Ident(ident) if self.variable(&ident.name).is_some() => {
                self.string_value(expr).map(Value::String)
            }
            other => Some(Value::String(other.to_string())),
        }
    }
}

/// `name { ... }` with no arguments
fn block_call<'a>(stmt: &'a Stmt, name: &str) -> Option<&'a Block> {
    match stmt {
        Stmt::Expr(Expr::Call(call))
            if call.args.is_empty() && call.callee_path().as_deref() == Some(name) =>
        {
            call.lambda.as_ref()
        }
        _ => None,
    }
}

fn is_tasks_receiver(call: &Call) -> bool {
    call.receiver()
        .and_then(Expr::path)
        .is_some_and(|path| path == "tasks")
}

/// Short rendering of a statement for messages
fn stmt_head(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Expr(expr) => expr.to_string(),
        Stmt::Assign { target, .. } => format!("{} = ...", target),
        Stmt::Val(decl) => format!("val {}", decl.name.name),
    }
}

/// Task type from `register<T>`, `withType<T>`, `T::class` or `T::class.java`
fn task_type_of(call: &Call) -> Option<String> {
    if let Some(type_arg) = call.type_args.first() {
        return Some(simple_type_name(type_arg).to_string());
    }
    call.positional().find_map(|arg| {
        let class_ref = match arg {
            Expr::Member { receiver, name, .. } if name.name == "java" => receiver.as_ref(),
            other => other,
        };
        match class_ref {
            Expr::ClassRef(ident, _) => Some(simple_type_name(&ident.name).to_string()),
            _ => None,
        }
    })
}

/// `scala`, `` `java-library` ``, `id("x")`, `kotlin("jvm")`, with `version` / `apply`
fn plugin_from_expr(expr: &Expr) -> Result<Plugin, String> {
    match expr {
        Expr::Ident(ident) => Ok(Plugin::new(ident.name.clone())),
        Expr::Call(call) => match (call.callee.as_ref(), call.callee_name()) {
            (Expr::Ident(_), Some("id")) => single_string_arg(call)
                .map(Plugin::new)
                .ok_or_else(|| "id() expects a single string argument".to_string()),
            (Expr::Ident(_), Some("kotlin")) => single_string_arg(call)
                .map(|module| Plugin::new(format!("org.jetbrains.kotlin.{}", module)))
                .ok_or_else(|| "kotlin() expects a single string argument".to_string()),
            (Expr::Member { receiver, .. }, Some(modifier @ ("version" | "apply"))) => {
                let plugin = plugin_from_expr(receiver)?;
                let value = call
                    .positional()
                    .next()
                    .ok_or_else(|| format!("'{}' expects an argument", modifier))?;
                apply_modifier(plugin, modifier, value)
            }
            _ => Err(format!("'{}' is not a plugin", expr)),
        },
        Expr::Infix { lhs, op, rhs, .. } => {
            let plugin = plugin_from_expr(lhs)?;
            apply_modifier(plugin, &op.name, rhs)
        }
        other => Err(format!("'{}' is not a plugin", other)),
    }
}

fn apply_modifier(mut plugin: Plugin, modifier: &str, value: &Expr) -> Result<Plugin, String> {
    match (modifier, value) {
        ("version", value) => {
            let version = value
                .as_plain_string()
                .ok_or_else(|| format!("plugin version must be a string literal, found {}", value))?;
            plugin.version = Some(version);
            Ok(plugin)
        }
        ("apply", Expr::Literal(Literal::Bool(apply), _)) => {
            plugin.apply = *apply;
            Ok(plugin)
        }
        ("apply", other) => Err(format!("'apply' expects true or false, found {}", other)),
        (other, _) => Err(format!("unknown plugin modifier '{}'", other)),
    }
}

fn single_string_arg(call: &Call) -> Option<String> {
    match call.args.as_slice() {
        [arg] if arg.name.is_none() => arg.value.as_plain_string(),
        _ => None,
    }
}
