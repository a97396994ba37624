//! Built-in applications selectable from the command line

use std::io::Read;

use crate::gateway::{Application, EnvValue, Environ, ResponseBody, StartResponse};

/// Names accepted by `lookup`
pub const NAMES: [&str; 3] = ["hello", "environ", "echo"];

/// Find a built-in application by name
pub fn lookup(name: &str) -> Option<Box<dyn Application>> {
    match name {
        "hello" => Some(Box::new(HelloWorld)),
        "environ" => Some(Box::new(EnvironDump)),
        "echo" => Some(Box::new(Echo)),
        _ => None,
    }
}

/// Always answers `200 OK` with `Hello, World!`
pub struct HelloWorld;

impl Application for HelloWorld {
    fn call(&self, _environ: &mut Environ, start_response: &mut StartResponse) -> ResponseBody {
        start_response.start_response("200 OK", [("Content-Type", "text/plain")], None);
        ResponseBody::once("Hello, World!")
    }

    fn name(&self) -> &str {
        "hello"
    }
}

/// Lists every environment key with its value, one per line
pub struct EnvironDump;

fn render_value(value: EnvValue<'_>) -> String {
    match value {
        EnvValue::Version(major, minor) => format!("({major}, {minor})"),
        EnvValue::Text(text) => text.to_string(),
        EnvValue::Flag(flag) => flag.to_string(),
        EnvValue::Stream => "<stream>".to_string(),
    }
}

impl Application for EnvironDump {
    fn call(&self, environ: &mut Environ, start_response: &mut StartResponse) -> ResponseBody {
        let lines: Vec<String> = environ
            .keys()
            .filter_map(|key| {
                environ
                    .get(key)
                    .map(|value| format!("{key} = {}\n", render_value(value)))
            })
            .collect();

        start_response.start_response(
            "200 OK",
            [("Content-Type", "text/plain; charset=utf-8")],
            None,
        );
        ResponseBody::from_chunks(lines)
    }

    fn name(&self) -> &str {
        "environ"
    }
}

/// Sends the raw request text back as the body
pub struct Echo;

impl Application for Echo {
    fn call(&self, environ: &mut Environ, start_response: &mut StartResponse) -> ResponseBody {
        let mut raw = String::new();
        if let Err(e) = environ.input().read_to_string(&mut raw) {
            use std::io::Write;
            let _ = writeln!(environ.errors(), "echo: failed to read input: {e}");
            start_response.start_response(
                "500 Internal Server Error",
                [("Content-Type", "text/plain")],
                Some(&e),
            );
            return ResponseBody::empty();
        }

        start_response.start_response("200 OK", [("Content-Type", "text/plain")], None);
        ResponseBody::once(raw)
    }

    fn name(&self) -> &str {
        "echo"
    }
}
