//! Same-page console overlay
//!
//! The bookmarklet flavour of the tools: no Host, no message channel.
//! The overlay lives in the page it was injected into and captures that
//! page's console into its own output.

use crate::bridge::ConsoleMethod;
use crate::frame::Frame;
use crate::utils::error::BridgeError;
use crate::utils::{FramescopeError, Result, clock_time, now_millis};
use boa_engine::{Context, JsArgs, JsValue as BoaJsValue, NativeFunction};
use boa_gc::{Finalize, Trace};
use std::sync::{Arc, Mutex};

/// Page marker guarding against double injection
pub const INJECTED_MARKER: &str = "devToolsInjected";

const EMIT_FUNCTION: &str = "__framescopeOverlayEmit";

const OVERLAY_SCRIPT: &str = r#"
(function () {
  var emit = globalThis.__framescopeOverlayEmit;
  ['log', 'error', 'warn', 'info'].forEach(function (method) {
    var ambient = console[method];
    console[method] = function () {
      var args = Array.prototype.slice.call(arguments);
      if (typeof ambient === 'function') {
        ambient.apply(console, args);
      }
      emit(method, args.map(function (arg) {
        return typeof arg === 'object' ? JSON.stringify(arg) : String(arg);
      }).join(' '));
    };
  });
  delete globalThis.__framescopeOverlayEmit;
  globalThis.devToolsInjected = true;
  console.log('Dev Tools injected successfully!');
})();
"#;

/// One line of overlay output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayLine {
    pub method: ConsoleMethod,
    /// `[HH:MM:SS] message`
    pub text: String,
}

impl OverlayLine {
    /// Text colour for the line
    pub fn color(&self) -> &'static str {
        match self.method {
            ConsoleMethod::Error => "#f48771",
            ConsoleMethod::Warn => "#dcdcaa",
            ConsoleMethod::Log | ConsoleMethod::Info => "white",
        }
    }
}

type SharedLines = Arc<Mutex<Vec<OverlayLine>>>;

#[derive(Trace, Finalize)]
struct LinesCapture {
    #[unsafe_ignore_trace]
    lines: SharedLines,
}

fn method_named(name: &str) -> ConsoleMethod {
    match name {
        "error" => ConsoleMethod::Error,
        "warn" => ConsoleMethod::Warn,
        "info" => ConsoleMethod::Info,
        _ => ConsoleMethod::Log,
    }
}

/// Console overlay attached to one page
pub struct Overlay {
    lines: SharedLines,
    expanded: bool,
}

impl Overlay {
    /// Inject into `frame`; `None` if an overlay is already there
    pub fn inject(frame: &mut Frame) -> Result<Option<Self>> {
        if !frame.set_marker(INJECTED_MARKER) {
            log::debug!("overlay already injected into {}", frame.url());
            return Ok(None);
        }

        let lines = SharedLines::default();
        let emit = NativeFunction::from_copy_closure_with_captures(
            |_this: &BoaJsValue, args: &[BoaJsValue], captures: &LinesCapture, ctx: &mut Context| {
                let method = args.get_or_undefined(0).to_string(ctx)?.to_std_string_escaped();
                let message = args.get_or_undefined(1).to_string(ctx)?.to_std_string_escaped();
                if let Ok(mut lines) = captures.lines.lock() {
                    lines.push(OverlayLine {
                        method: method_named(&method),
                        text: format!("[{}] {}", clock_time(now_millis()), message),
                    });
                }
                Ok(BoaJsValue::undefined())
            },
            LinesCapture {
                lines: Arc::clone(&lines),
            },
        );

        let runtime = frame.runtime_mut();
        runtime.register_global_callable(EMIT_FUNCTION, 2, emit)?;
        runtime.execute(OVERLAY_SCRIPT)?;

        Ok(Some(Self {
            lines,
            expanded: false,
        }))
    }

    /// Show or hide the output area; returns whether it is now shown
    pub fn toggle(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Empty the output
    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }

    /// Captured output, oldest first
    pub fn lines(&self) -> Vec<OverlayLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Evaluate `code` in the page, logging `Result: …` or `Error: …`
    pub fn run_code(&self, frame: &mut Frame, code: &str) -> Result<()> {
        let literal = serde_json::to_string(code)
            .map_err(|e| FramescopeError::from(BridgeError::Encode(e.to_string())))?;
        frame.run_script(&format!(
            "(function () {{ try {{ console.log('Result:', (0, eval)({})); }} catch (error) {{ console.error('Error:', error.message); }} }})();",
            literal
        ))?;
        Ok(())
    }
}
