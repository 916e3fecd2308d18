use std::cell::Cell;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use delegated_actions::action::{ActionInvocation, ActionOptions};
use delegated_actions::runtime::{DomPatch, ElementId, MemoryDom};
use delegated_actions::scope::{Expr, PathHooks, Scope};
use delegated_actions::value::{ObjectTarget, Value};
use delegated_actions::{ActionEvent, ActionSystem, MouseButton, RuntimeConfig};
use keyboard_types::Modifiers;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_EVENTS: &[&str] = &[
    "click",
    "click+shift",
    "click@secondary",
    "keydown+shift",
    "keydown+shift+ctrl",
];

/// Parse `type[+modifier...][@button]`, e.g. `click+shift@auxiliary`.
fn parse_event(spec: &str, target: ElementId) -> Result<ActionEvent> {
    let (head, button) = match spec.split_once('@') {
        Some((head, button)) => (head, Some(parse_button(button)?)),
        None => (spec, None),
    };
    let mut parts = head.split('+');
    let event_type = parts
        .next()
        .filter(|name| !name.is_empty())
        .with_context(|| format!("event spec '{spec}' has no event type"))?;

    let mut modifiers = Modifiers::empty();
    for name in parts {
        modifiers |= match name {
            "alt" => Modifiers::ALT,
            "shift" => Modifiers::SHIFT,
            "meta" => Modifiers::META,
            "ctrl" => Modifiers::CONTROL,
            other => bail!("unknown modifier '{other}' in '{spec}'"),
        };
    }

    let mut event = ActionEvent::new(event_type, target).with_modifiers(modifiers);
    if let Some(button) = button {
        event = event.with_button(button);
    }
    Ok(event)
}

fn parse_button(name: &str) -> Result<MouseButton> {
    Ok(match name {
        "main" => MouseButton::Main,
        "auxiliary" => MouseButton::Auxiliary,
        "secondary" => MouseButton::Secondary,
        "fourth" => MouseButton::Fourth,
        "fifth" => MouseButton::Fifth,
        other => bail!("unknown mouse button '{other}'"),
    })
}

fn main() -> Result<()> {
    let subscriber_result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
    if subscriber_result.is_err() {
        // tracing was already initialised; continue silently
    }

    let config = RuntimeConfig::from_env().context("failed to load action configuration")?;
    let system = ActionSystem::new(config);

    let mut dom = MemoryDom::new();
    let app = dom.create_element("div");
    let button = dom.create_element("button");
    let input = dom.create_element("input");
    dom.append_child(app, button)?;
    dom.append_child(app, input)?;

    let count = Rc::new(Cell::new(0));
    let renders = Rc::new(Cell::new(0));
    {
        let renders = Rc::clone(&renders);
        system
            .run_loop()
            .on_render(move || renders.set(renders.get() + 1));
    }

    let counter = {
        let count = Rc::clone(&count);
        let run_loop = Rc::clone(system.run_loop());
        ObjectTarget::new("counter").with_send(move |action, args| {
            debug!(
                action,
                args = %delegated_actions::value::Value::List(args.to_vec()).to_json(),
                "counter received action"
            );
            let step = args.first().and_then(|arg| match arg {
                Value::Number(step) => Some(*step as i64),
                _ => None,
            });
            match action {
                "increment" => count.set(count.get() + step.unwrap_or(1)),
                "reset" => count.set(0),
                other => bail!("counter does not handle '{other}'"),
            }
            run_loop.request_render();
            Ok(())
        })
    };
    let scope = Scope::new(Value::object(ObjectTarget::new("view")))
        .with_controller(Value::object(counter))
        .with_local("step", 5);

    let increment = system.create_node(button);
    system.render_action(
        increment,
        &PathHooks,
        &scope,
        &ActionInvocation::new("increment").arg(Expr::path("step")),
        &mut dom,
    )?;

    let reset = system.create_node(input);
    let options = ActionOptions::from_hash([
        ("on", Expr::literal("keydown")),
        ("allowedKeys", Expr::literal("shift")),
    ])?;
    system.render_action(
        reset,
        &PathHooks,
        &scope,
        &ActionInvocation::new("reset").with_options(options),
        &mut dom,
    )?;

    let specs: Vec<String> = std::env::args().skip(1).collect();
    let specs: Vec<&str> = if specs.is_empty() {
        DEFAULT_EVENTS.to_vec()
    } else {
        specs.iter().map(String::as_str).collect()
    };

    for spec in specs {
        let target = if spec.starts_with("key") { input } else { button };
        let mut event = match parse_event(spec, target) {
            Ok(event) => event,
            Err(err) => {
                warn!("skipping event: {err:#}");
                continue;
            }
        };
        let chain = dom.node_chain(target);
        let outcome = system.dispatch_event(&dom, &chain, &mut event)?;
        let summary = system.flush()?;
        info!(
            event = spec,
            scheduled = outcome.actions_scheduled,
            default_prevented = outcome.default_prevented,
            rendered = summary.rendered,
            count = count.get(),
            "dispatched"
        );
    }

    system.destroy_node(increment, &mut dom)?;
    system.destroy_node(reset, &mut dom)?;
    info!(
        renders = renders.get(),
        registered = system.registry().len(),
        "done"
    );

    let patches: Vec<DomPatch> = dom.drain_mutations();
    println!("{}", serde_json::to_string_pretty(&patches)?);
    Ok(())
}
