//! End-to-end: render a dates form, submit it, evaluate the date range.

use field_metadata::prelude::*;
use render_hooks::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatesBean {
    start_date: Option<String>,
    end_date: Option<String>,
}

struct App {
    interceptors: OrderedArtifactCache,
    deferred: DeferredValidation,
    cache: Arc<ReflectionCache>,
}

fn app() -> App {
    let registry = Arc::new(
        TypeRegistry::with_builtin_annotations()
            .with_type(
                TypeDescriptor::class("DatesBean")
                    .annotated(
                        Annotation::new(keys::DATE_RANGE)
                            .with_attribute("start", "startDate")
                            .with_attribute("end", "endDate"),
                    )
                    .field("startDate", [Annotation::new(keys::RECORD_VALUE)])
                    .field(
                        "endDate",
                        [Annotation::new(keys::RECORD_VALUE), Annotation::new(keys::NOT_NULL)],
                    )
                    .getter("startDate", [])
                    .getter("endDate", [])
                    .setter("startDate")
                    .setter("endDate")
                    .constructible::<DatesBean>(),
            )
            .with_type(TypeDescriptor::class("DatesBean$$Proxy").extends("DatesBean").proxy_of("DatesBean")),
    );
    let checks = Arc::new(ValidatorRegistry::with_builtins());
    let cache = Arc::new(ReflectionCache::new(registry.clone()));

    let config = ValidationConfig::default();
    let extractor = MetadataExtractor::new(
        cache.clone(),
        Arc::new(ExpressionBindingResolver::new().with_bean("dates", "DatesBean$$Proxy")),
    )
    .with_config(&config);
    let initializers = OrderedArtifactCache::new(Arc::new(
        StaticLocator::new().with_initializer(Arc::new(RequiredInitializer)),
    ));
    let interceptor = MetadataInterceptor::new(Arc::new(extractor), Arc::new(initializers));
    let interceptors =
        OrderedArtifactCache::new(Arc::new(StaticLocator::new().with_interceptor(Arc::new(interceptor))));

    let engine = Arc::new(ConstraintEngine::new(registry.clone(), checks.clone()));
    let manager = RecordingManager::new(cache.clone(), engine, config);
    let deferred = DeferredValidation::new(ConstraintIndex::new(registry, checks), Arc::new(manager));

    App {
        interceptors,
        deferred,
        cache,
    }
}

fn form() -> Vec<Component> {
    vec![
        Component::new("form:startDate", ComponentKind::InputText).with_value_expression("#{dates.startDate}"),
        Component::new("form:endDate", ComponentKind::InputText).with_value_expression("#{dates.endDate}"),
        Component::new("form:submit", ComponentKind::Command),
    ]
}

/// Renders the form, then records each submitted value and evaluates.
fn submit(app: &App, start: Value, end: Value) -> (bool, Vec<UserMessage>, Vec<Component>) {
    let mut ctx = RequestContext::new();
    let mut components = form();
    let interceptors = app.interceptors.renderer_interceptors();

    for component in components.iter_mut() {
        run_before_encode(&interceptors, &mut ctx, component).unwrap();
        run_after_encode(&interceptors, &mut ctx, component).unwrap();
    }

    for (client_id, value) in [("form:startDate", start), ("form:endDate", end)] {
        let info = MetadataInterceptor::extracted(&ctx, client_id).unwrap().clone();
        app.deferred.process(&mut ctx, &info, value).unwrap();
    }

    let valid = app.deferred.finish(&mut ctx).unwrap();
    (valid, ctx.release(), components)
}

#[test]
fn start_after_end_reports_one_message() {
    let app = app();
    let (valid, messages, _) = submit(&app, json!("2024-01-01"), json!("2023-01-01"));

    assert!(!valid);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].severity, Severity::Error);
    assert_eq!(messages[0].summary, "startDate must not be after endDate");
}

#[test]
fn ordered_dates_are_valid() {
    let app = app();
    let (valid, messages, _) = submit(&app, json!("2023-01-01"), json!("2024-01-01"));

    assert!(valid);
    assert!(messages.is_empty());
}

#[test]
fn missing_end_date_is_not_reported_by_the_date_range_group() {
    let app = app();
    let (valid, messages, _) = submit(&app, json!("2024-01-01"), Value::Null);

    assert!(valid);
    assert!(messages.is_empty());
}

#[test]
fn render_marks_not_null_inputs_required() {
    let app = app();
    let (_, _, components) = submit(&app, json!("2023-01-01"), json!("2024-01-01"));

    assert!(!components[0].is_required());
    assert!(components[1].is_required());
    assert!(!components[2].is_required());
}

#[test]
fn second_request_reuses_cached_lookups() {
    let app = app();
    submit(&app, json!("2023-01-01"), json!("2024-01-01"));
    let after_first = app.cache.stats();

    submit(&app, json!("2024-01-01"), json!("2023-01-01"));
    let after_second = app.cache.stats();

    assert_eq!(after_second.misses, after_first.misses);
    assert_eq!(after_second.entries, after_first.entries);
    assert!(after_second.hits > after_first.hits);
}
