//! ---
//! su_section: "03-logging"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Structured logging context and session event helpers."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---

#[doc(hidden)]
#[macro_export]
macro_rules! __su_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            $level,
            user = ctx.user.unwrap_or(""),
            route = ctx.route.unwrap_or(""),
            method = ctx.method.unwrap_or(""),
            request = ctx.request.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with console context.
#[macro_export]
macro_rules! su_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__su_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__su_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with console context.
#[macro_export]
macro_rules! su_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__su_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__su_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with console context.
#[macro_export]
macro_rules! su_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__su_event!(tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__su_event!(tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with console context.
#[macro_export]
macro_rules! su_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__su_event!(tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__su_event!(tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
