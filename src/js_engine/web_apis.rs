//! Web APIs implementation for the frame's JavaScript runtime
//!
//! Implements the browser-like globals a loaded document starts with:
//! - console (writes to the `log` facade)
//! - window
//! - location
//! - document (title, URL)
//! - localStorage / sessionStorage bound to the origin's storage areas

use super::JsRuntime;
use crate::storage::{OriginStorage, StorageArea};
use crate::utils::Result;
use boa_engine::{
    Context, JsArgs, JsObject, JsResult, JsString, JsValue as BoaJsValue, NativeFunction,
    object::ObjectInitializer, property::Attribute,
};
use boa_gc::{Finalize, Trace};
use url::Url;

/// Log target for console output produced inside frames
pub const FRAME_LOG_TARGET: &str = "framescope::frame";

/// Document facts exposed to scripts
pub struct PageGlobals<'a> {
    pub url: &'a Url,
    pub title: &'a str,
    pub storage: &'a OriginStorage,
}

/// Initialize all Web APIs in the JavaScript runtime
pub fn init_web_apis(runtime: &mut JsRuntime, page: &PageGlobals<'_>) -> Result<()> {
    let context = runtime.context_mut();
    let globals = [
        ("console", console_object(context)),
        // `window` is the global object itself
        ("window", context.global_object()),
        ("location", location_object(context, page.url)),
        ("document", document_object(context, page)),
        ("localStorage", storage_object(context, &page.storage.local)),
        ("sessionStorage", storage_object(context, &page.storage.session)),
    ];
    for (name, object) in globals {
        runtime.register_global_property(name, object)?;
    }
    Ok(())
}

fn join_args(args: &[BoaJsValue], ctx: &mut Context) -> JsResult<String> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(arg.to_string(ctx)?.to_std_string_escaped());
    }
    Ok(parts.join(" "))
}

/// Baseline console: the ambient logger agents wrap
fn console_object(context: &mut Context) -> JsObject {
    let log_fn = NativeFunction::from_copy_closure(|_this, args, ctx| {
        log::info!(target: FRAME_LOG_TARGET, "{}", join_args(args, ctx)?);
        Ok(BoaJsValue::undefined())
    });
    let info_fn = NativeFunction::from_copy_closure(|_this, args, ctx| {
        log::info!(target: FRAME_LOG_TARGET, "{}", join_args(args, ctx)?);
        Ok(BoaJsValue::undefined())
    });
    let warn_fn = NativeFunction::from_copy_closure(|_this, args, ctx| {
        log::warn!(target: FRAME_LOG_TARGET, "{}", join_args(args, ctx)?);
        Ok(BoaJsValue::undefined())
    });
    let error_fn = NativeFunction::from_copy_closure(|_this, args, ctx| {
        log::error!(target: FRAME_LOG_TARGET, "{}", join_args(args, ctx)?);
        Ok(BoaJsValue::undefined())
    });

    ObjectInitializer::new(context)
        .function(log_fn, JsString::from("log"), 0)
        .function(info_fn, JsString::from("info"), 0)
        .function(warn_fn, JsString::from("warn"), 0)
        .function(error_fn, JsString::from("error"), 0)
        .build()
}

fn location_object(context: &mut Context, url: &Url) -> JsObject {
    let search = url.query().map(|q| format!("?{}", q)).unwrap_or_default();
    let hash = url.fragment().map(|f| format!("#{}", f)).unwrap_or_default();
    let fields = [
        ("href", url.as_str().to_string()),
        ("origin", url.origin().ascii_serialization()),
        ("protocol", format!("{}:", url.scheme())),
        ("host", url.host_str().map(|h| match url.port() {
            Some(port) => format!("{}:{}", h, port),
            None => h.to_string(),
        }).unwrap_or_default()),
        ("hostname", url.host_str().unwrap_or_default().to_string()),
        ("pathname", url.path().to_string()),
        ("search", search),
        ("hash", hash),
    ];

    let mut init = ObjectInitializer::new(context);
    for (name, value) in fields {
        init.property(
            JsString::from(name),
            BoaJsValue::from(JsString::from(value.as_str())),
            Attribute::READONLY,
        );
    }
    init.build()
}

fn document_object(context: &mut Context, page: &PageGlobals<'_>) -> JsObject {
    ObjectInitializer::new(context)
        .property(
            JsString::from("title"),
            BoaJsValue::from(JsString::from(page.title)),
            Attribute::all(),
        )
        .property(
            JsString::from("URL"),
            BoaJsValue::from(JsString::from(page.url.as_str())),
            Attribute::READONLY,
        )
        .build()
}

/// Storage area handle captured by the native storage functions
#[derive(Trace, Finalize)]
struct AreaCapture {
    #[unsafe_ignore_trace]
    area: StorageArea,
}

fn storage_object(context: &mut Context, area: &StorageArea) -> JsObject {
    let get_item = NativeFunction::from_copy_closure_with_captures(
        |_this: &BoaJsValue, args: &[BoaJsValue], captures: &AreaCapture, ctx: &mut Context| {
            let key = args.get_or_undefined(0).to_string(ctx)?.to_std_string_escaped();
            Ok(captures
                .area
                .get_item(&key)
                .map(|v| BoaJsValue::from(JsString::from(v.as_str())))
                .unwrap_or_else(BoaJsValue::null))
        },
        AreaCapture { area: area.clone() },
    );

    let set_item = NativeFunction::from_copy_closure_with_captures(
        |_this: &BoaJsValue, args: &[BoaJsValue], captures: &AreaCapture, ctx: &mut Context| {
            let key = args.get_or_undefined(0).to_string(ctx)?.to_std_string_escaped();
            let value = args.get_or_undefined(1).to_string(ctx)?.to_std_string_escaped();
            log::debug!("[JS] storage.setItem('{}', '{}')", key, value);
            captures.area.set_item(&key, &value);
            Ok(BoaJsValue::undefined())
        },
        AreaCapture { area: area.clone() },
    );

    let remove_item = NativeFunction::from_copy_closure_with_captures(
        |_this: &BoaJsValue, args: &[BoaJsValue], captures: &AreaCapture, ctx: &mut Context| {
            let key = args.get_or_undefined(0).to_string(ctx)?.to_std_string_escaped();
            captures.area.remove_item(&key);
            Ok(BoaJsValue::undefined())
        },
        AreaCapture { area: area.clone() },
    );

    let clear = NativeFunction::from_copy_closure_with_captures(
        |_this: &BoaJsValue, _args: &[BoaJsValue], captures: &AreaCapture, _ctx: &mut Context| {
            captures.area.clear();
            Ok(BoaJsValue::undefined())
        },
        AreaCapture { area: area.clone() },
    );

    let key = NativeFunction::from_copy_closure_with_captures(
        |_this: &BoaJsValue, args: &[BoaJsValue], captures: &AreaCapture, ctx: &mut Context| {
            let index = args.get_or_undefined(0).to_number(ctx)?;
            if index.is_nan() || index < 0.0 {
                return Ok(BoaJsValue::null());
            }
            Ok(captures
                .area
                .key(index as usize)
                .map(|k| BoaJsValue::from(JsString::from(k.as_str())))
                .unwrap_or_else(BoaJsValue::null))
        },
        AreaCapture { area: area.clone() },
    );

    ObjectInitializer::new(context)
        .function(get_item, JsString::from("getItem"), 1)
        .function(set_item, JsString::from("setItem"), 2)
        .function(remove_item, JsString::from("removeItem"), 1)
        .function(clear, JsString::from("clear"), 0)
        .function(key, JsString::from("key"), 1)
        .build()
}
