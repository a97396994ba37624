//! Application calling convention
//!
//! An application receives the call environment and the response
//! registration capability, registers its status and headers, and returns
//! its body. Plain closures with the matching signature are applications.

use super::environ::Environ;
use super::response::{ResponseBody, StartResponse};

pub trait Application {
    /// Handle one request.
    ///
    /// Must call `start_response.start_response(..)` before returning,
    /// otherwise the exchange fails with `MissingResponseRegistration`.
    fn call(&self, environ: &mut Environ, start_response: &mut StartResponse) -> ResponseBody;

    /// Name shown in the startup banner
    fn name(&self) -> &str {
        "application"
    }
}

impl<F> Application for F
where
    F: Fn(&mut Environ, &mut StartResponse) -> ResponseBody,
{
    fn call(&self, environ: &mut Environ, start_response: &mut StartResponse) -> ResponseBody {
        self(environ, start_response)
    }
}
