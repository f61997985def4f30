//! Embedded agent
//!
//! Instrumentation that runs inside a frame's document. Injecting it
//! wraps the page's console so every call is forwarded to the Host,
//! installs an evaluator for console commands, and attaches a session
//! that answers Host messages on each [`Frame::pump`].
//!
//! All agent state belongs to the frame it was injected into; a new
//! document starts uninstrumented.

mod inspector;

pub use inspector::{HOVER_RULE, InspectorInstall, structural_path};

use crate::bridge::{AgentLink, AgentMessage, HostMessage, Inbox, Outbox, RequestId};
use crate::frame::Frame;
use crate::utils::error::BridgeError;
use crate::utils::{FramescopeError, Result};
use boa_engine::{Context, JsArgs, JsValue as BoaJsValue, NativeFunction};
use boa_gc::{Finalize, Trace};

/// Native bridge exposed to the agent script while it boots
const POST_FUNCTION: &str = "__framescopePost";

/// Non-enumerable global the agent script defines
const AGENT_GLOBAL: &str = "__framescopeAgent";

const AGENT_SCRIPT: &str = r#"
(function () {
  if (globalThis.__framescopeAgent) {
    return false;
  }
  var post = globalThis.__framescopePost;
  var send = function (message) {
    post(JSON.stringify(message));
  };
  var stringify = function (arg) {
    if (typeof arg === 'object' && arg !== null) {
      try {
        return JSON.stringify(arg, null, 2);
      } catch (e) {
        return String(arg);
      }
    }
    return String(arg);
  };

  ['log', 'error', 'warn', 'info'].forEach(function (method) {
    var ambient = console[method];
    console[method] = function () {
      var args = Array.prototype.slice.call(arguments);
      if (typeof ambient === 'function') {
        ambient.apply(console, args);
      }
      send({
        type: 'console',
        method: method,
        args: args.map(stringify),
        timestamp: Math.floor(Date.now())
      });
    };
  });

  Object.defineProperty(globalThis, '__framescopeAgent', {
    value: {
      evaluate: function (id, code) {
        try {
          var result = (0, eval)(code);
          send({ type: 'consoleResult', id: id, result: String(result) });
        } catch (error) {
          var message = (error !== null && typeof error === 'object' && 'message' in error)
            ? String(error.message)
            : String(error);
          send({ type: 'consoleError', id: id, error: message });
        }
      }
    },
    enumerable: false
  });
  delete globalThis.__framescopePost;
  return true;
})();
"#;

/// Outbox handed to the native post function
#[derive(Trace, Finalize)]
struct OutboxCapture {
    #[unsafe_ignore_trace]
    outbox: Outbox<AgentMessage>,
}

/// Agent state living inside one frame
pub struct FrameSession {
    inbox: Inbox<HostMessage>,
    outbox: Outbox<AgentMessage>,
    inspector: Option<InspectorInstall>,
}

impl FrameSession {
    /// Whether the element picker is installed
    pub fn inspecting(&self) -> bool {
        self.inspector.is_some()
    }

    /// Handles of the installed element picker
    pub fn installed_inspector(&self) -> Option<InspectorInstall> {
        self.inspector
    }

    /// Single dispatch point for Host messages; returns how many were handled
    pub(crate) fn pump(&mut self, frame: &mut Frame) -> usize {
        let mut handled = 0;
        while let Some(received) = self.inbox.try_next() {
            match received {
                Ok(message) => {
                    self.dispatch(frame, message);
                    handled += 1;
                }
                Err(e) => log::warn!("agent dropped message: {}", e),
            }
        }
        handled
    }

    fn dispatch(&mut self, frame: &mut Frame, message: HostMessage) {
        match message {
            HostMessage::ConsoleCommand { id, code } => self.evaluate(frame, id, &code),
            HostMessage::SetInspectMode { enabled } => {
                if let Err(e) = self.set_inspect_mode(frame, enabled) {
                    log::warn!("inspect mode change failed: {}", e);
                }
            }
        }
    }

    /// Evaluate `code` at global scope; exactly one reply is posted for `id`
    fn evaluate(&mut self, frame: &mut Frame, id: RequestId, code: &str) {
        let call = serde_json::to_string(code)
            .map_err(|e| FramescopeError::from(BridgeError::Encode(e.to_string())))
            .and_then(|literal| {
                frame
                    .runtime_mut()
                    .execute(&format!("{}.evaluate({}, {});", AGENT_GLOBAL, id, literal))
            });

        if let Err(e) = call {
            log::debug!("evaluator unavailable for request {}: {}", id, e);
            let reply = AgentMessage::ConsoleError {
                id,
                error: e.to_string(),
            };
            if let Err(e) = self.outbox.post(&reply) {
                log::debug!("reply for request {} not delivered: {}", id, e);
            }
        }
    }

    /// Turn the picker on or off; repeated requests are no-ops
    pub(crate) fn set_inspect_mode(&mut self, frame: &mut Frame, enabled: bool) -> Result<()> {
        match (enabled, self.inspector.take()) {
            (true, None) => {
                self.inspector = Some(inspector::install(frame, self.outbox.clone())?);
            }
            (false, Some(installed)) => {
                inspector::uninstall(frame, installed);
                log::debug!("inspector removed");
            }
            (_, current) => self.inspector = current,
        }
        Ok(())
    }
}

/// Inject the agent into `frame`
///
/// Returns `false` without touching anything when the frame already
/// carries an agent.
pub fn inject(frame: &mut Frame, link: AgentLink) -> Result<bool> {
    if frame.has_session() {
        log::debug!("agent already present in {}", frame.url());
        return Ok(false);
    }

    let post = NativeFunction::from_copy_closure_with_captures(
        |_this: &BoaJsValue, args: &[BoaJsValue], captures: &OutboxCapture, ctx: &mut Context| {
            let envelope = args.get_or_undefined(0).to_string(ctx)?.to_std_string_escaped();
            if let Err(e) = captures.outbox.post_raw(envelope) {
                log::debug!("agent post dropped: {}", e);
            }
            Ok(BoaJsValue::undefined())
        },
        OutboxCapture {
            outbox: link.outbox.clone(),
        },
    );

    let runtime = frame.runtime_mut();
    runtime.register_global_callable(POST_FUNCTION, 1, post)?;
    runtime.execute(AGENT_SCRIPT)?;

    frame.install_session(FrameSession {
        inbox: link.inbox,
        outbox: link.outbox,
        inspector: None,
    });
    log::info!("agent injected into {}", frame.url());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{ConsoleMethod, channel};
    use crate::frame::{ClickOutcome, LoadedPage};
    use crate::storage::OriginStorage;
    use pretty_assertions::assert_eq;
    use url::Url;

    struct Harness {
        frame: Frame,
        commands: Outbox<HostMessage>,
        replies: Inbox<AgentMessage>,
    }

    fn injected(html: &str) -> Harness {
        let url = Url::parse("https://example.com/").unwrap();
        let mut frame = Frame::load(LoadedPage::new(url, html), OriginStorage::default()).unwrap();
        let (commands, inbox) = channel::<HostMessage>();
        let (outbox, replies) = channel::<AgentMessage>();
        assert!(inject(&mut frame, AgentLink { inbox, outbox }).unwrap());
        Harness {
            frame,
            commands,
            replies,
        }
    }

    fn replies(h: &mut Harness) -> Vec<AgentMessage> {
        h.replies.drain().into_iter().map(|m| m.unwrap()).collect()
    }

    #[test]
    fn test_console_calls_are_forwarded() {
        let mut h = injected("");
        h.frame
            .run_script("console.warn('careful', 3, {a: 1}, null)")
            .unwrap();
        match &replies(&mut h)[..] {
            [AgentMessage::Console {
                method,
                args,
                timestamp,
            }] => {
                assert_eq!(*method, ConsoleMethod::Warn);
                assert_eq!(args, &vec![
                    "careful".to_string(),
                    "3".to_string(),
                    "{\n  \"a\": 1\n}".to_string(),
                    "null".to_string(),
                ]);
                assert!(timestamp.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_console_command_result_and_error() {
        let mut h = injected("");
        h.commands
            .post(&HostMessage::ConsoleCommand {
                id: 1,
                code: "2 + 2".into(),
            })
            .unwrap();
        h.commands
            .post(&HostMessage::ConsoleCommand {
                id: 2,
                code: "undefinedVar.x".into(),
            })
            .unwrap();
        assert_eq!(h.frame.pump(), 2);

        let got = replies(&mut h);
        assert_eq!(
            got[0],
            AgentMessage::ConsoleResult {
                id: 1,
                result: "4".into()
            }
        );
        match &got[1] {
            AgentMessage::ConsoleError { id: 2, error } => assert!(error.contains("undefinedVar")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_evaluation_runs_at_global_scope() {
        let mut h = injected("");
        h.commands
            .post(&HostMessage::ConsoleCommand {
                id: 7,
                code: "var fromConsole = 'kept'; fromConsole".into(),
            })
            .unwrap();
        h.frame.pump();
        assert_eq!(
            h.frame.run_script("fromConsole").unwrap(),
            crate::js_engine::JsValue::String("kept".into())
        );
        assert_eq!(
            replies(&mut h),
            vec![AgentMessage::ConsoleResult {
                id: 7,
                result: "kept".into()
            }]
        );
    }

    #[test]
    fn test_injection_is_once_per_frame() {
        let mut h = injected("");
        let (_tx, inbox) = channel::<HostMessage>();
        let (outbox, _rx) = channel::<AgentMessage>();
        assert!(!inject(&mut h.frame, AgentLink { inbox, outbox }).unwrap());

        h.frame.run_script("console.log('once')").unwrap();
        assert_eq!(replies(&mut h).len(), 1);
        assert!(!h.frame.has_global(POST_FUNCTION));
    }

    #[test]
    fn test_inspect_mode_roundtrip() {
        let mut h = injected(r#"<a href="/away"><button id="submit-btn">Go</button></a>"#);
        let button = h.frame.document().get_element_by_id("submit-btn").unwrap().id;
        let elements_before = h.frame.document().element_count();

        for _ in 0..2 {
            h.commands
                .post(&HostMessage::SetInspectMode { enabled: true })
                .unwrap();
        }
        h.frame.pump();
        assert_eq!(h.frame.listener_count(), 1);
        assert_eq!(h.frame.document().element_count(), elements_before + 1);
        assert!(h.frame.hover_rule_active());

        assert_eq!(h.frame.click(button).unwrap(), ClickOutcome::Intercepted);
        assert_eq!(
            replies(&mut h),
            vec![AgentMessage::ElementSelected {
                html: r#"<button id="submit-btn">Go</button>"#.into(),
                path: r#"//*[@id="submit-btn"]"#.into(),
            }]
        );

        h.commands
            .post(&HostMessage::SetInspectMode { enabled: false })
            .unwrap();
        h.commands
            .post(&HostMessage::SetInspectMode { enabled: false })
            .unwrap();
        h.frame.pump();
        assert_eq!(h.frame.listener_count(), 0);
        assert_eq!(h.frame.document().element_count(), elements_before);
        assert!(!h.frame.hover_rule_active());
        assert!(matches!(h.frame.click(button).unwrap(), ClickOutcome::Navigate(_)));
        assert!(replies(&mut h).is_empty());
    }

    #[test]
    fn test_deactivation_leaves_page_styles_alone() {
        let mut h = injected("<style>*:hover { color: red }</style><p>x</p>");
        h.commands
            .post(&HostMessage::SetInspectMode { enabled: true })
            .unwrap();
        h.commands
            .post(&HostMessage::SetInspectMode { enabled: false })
            .unwrap();
        h.frame.pump();
        assert!(!h.frame.hover_rule_active());
        assert_eq!(
            h.frame
                .document()
                .elements()
                .iter()
                .filter(|(_, n)| n.has_tag("style"))
                .count(),
            1
        );
    }

    #[test]
    fn test_malformed_host_message_is_dropped() {
        let mut h = injected("");
        h.commands.post_raw(r#"{"type":"reboot"}"#.into()).unwrap();
        h.commands
            .post(&HostMessage::ConsoleCommand {
                id: 3,
                code: "'ok'".into(),
            })
            .unwrap();
        assert_eq!(h.frame.pump(), 1);
        assert_eq!(
            replies(&mut h),
            vec![AgentMessage::ConsoleResult {
                id: 3,
                result: "ok".into()
            }]
        );
    }
}
