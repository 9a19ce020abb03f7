//! Chained method-call builder over a `syn::Expr`.

use proc_macro2::Span;
use syn::punctuated::Punctuated;
use syn::{Expr, ExprMethodCall, Ident, Token};

/// Owns a call expression and grows it by wrapping it in method calls.
///
/// Each call to [`BuilderCall::method`] turns the current expression into the
/// receiver of a new outer call, so `field::int("age")` becomes
/// `field::int("age").optional()`.
#[derive(Debug, Clone)]
pub struct BuilderCall {
    curr: Expr,
}

impl BuilderCall {
    pub fn new(expr: Expr) -> Self {
        Self { curr: expr }
    }

    /// Append `.name(args...)` to the chain.
    pub fn method<I>(&mut self, name: &str, args: I)
    where
        I: IntoIterator<Item = Expr>,
    {
        let receiver = std::mem::replace(&mut self.curr, Expr::Verbatim(Default::default()));
        self.curr = Expr::MethodCall(ExprMethodCall {
            attrs: Vec::new(),
            receiver: Box::new(receiver),
            dot_token: <Token![.]>::default(),
            method: Ident::new(name, Span::call_site()),
            turbofish: None,
            paren_token: Default::default(),
            args: args.into_iter().collect::<Punctuated<Expr, Token![,]>>(),
        });
    }

    pub fn expr(&self) -> &Expr {
        &self.curr
    }

    pub fn into_expr(self) -> Expr {
        self.curr
    }
}
