//! Checks that emitted JavaScript only uses ES5 syntax.

use swc_common::{sync::Lrc, FileName, SourceMap};
use swc_ecma_ast::*;
use swc_ecma_parser::{parse_file_as_program, EsSyntax, Syntax};
use swc_ecma_visit::{Visit, VisitWith};

/// Names of the post-ES5 constructs found in `js`, in first-seen order.
/// Empty means an ES5 engine can run it. Panics if `js` does not parse.
pub fn later_syntax(js: &str) -> Vec<&'static str> {
    let cm: Lrc<SourceMap> = Lrc::new(SourceMap::default());
    let fm = cm.new_source_file(Lrc::new(FileName::Anon), js.to_string());
    let mut recovered = Vec::new();
    let program = parse_file_as_program(
        &fm,
        Syntax::Es(EsSyntax::default()),
        EsVersion::Es5,
        None,
        &mut recovered,
    )
    .unwrap_or_else(|e| panic!("output does not parse: {:?}\n{js}", e.kind()));
    assert!(recovered.is_empty(), "output has recoverable errors:\n{js}");

    let mut finder = LaterSyntax::default();
    program.visit_with(&mut finder);
    finder.found
}

#[derive(Default)]
struct LaterSyntax {
    found: Vec<&'static str>,
}

impl LaterSyntax {
    fn note(&mut self, what: &'static str) {
        if !self.found.contains(&what) {
            self.found.push(what);
        }
    }
}

impl Visit for LaterSyntax {
    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        self.note("arrow function");
        n.visit_children_with(self);
    }

    fn visit_class(&mut self, n: &Class) {
        self.note("class");
        n.visit_children_with(self);
    }

    fn visit_tpl(&mut self, n: &Tpl) {
        self.note("template literal");
        n.visit_children_with(self);
    }

    fn visit_var_decl(&mut self, n: &VarDecl) {
        match n.kind {
            VarDeclKind::Var => {}
            VarDeclKind::Let => self.note("let"),
            VarDeclKind::Const => self.note("const"),
        }
        n.visit_children_with(self);
    }

    fn visit_spread_element(&mut self, n: &SpreadElement) {
        self.note("spread");
        n.visit_children_with(self);
    }

    fn visit_rest_pat(&mut self, n: &RestPat) {
        self.note("rest pattern");
        n.visit_children_with(self);
    }

    fn visit_object_pat(&mut self, n: &ObjectPat) {
        self.note("destructuring");
        n.visit_children_with(self);
    }

    fn visit_array_pat(&mut self, n: &ArrayPat) {
        self.note("destructuring");
        n.visit_children_with(self);
    }

    fn visit_bin_expr(&mut self, n: &BinExpr) {
        match n.op {
            BinaryOp::Exp => self.note("exponent operator"),
            BinaryOp::NullishCoalescing => self.note("nullish coalescing"),
            _ => {}
        }
        n.visit_children_with(self);
    }

    fn visit_opt_chain_expr(&mut self, n: &OptChainExpr) {
        self.note("optional chaining");
        n.visit_children_with(self);
    }

    fn visit_for_of_stmt(&mut self, n: &ForOfStmt) {
        self.note("for-of");
        n.visit_children_with(self);
    }

    fn visit_function(&mut self, n: &Function) {
        if n.is_async {
            self.note("async function");
        }
        if n.is_generator {
            self.note("generator");
        }
        n.visit_children_with(self);
    }

    fn visit_module_decl(&mut self, n: &ModuleDecl) {
        self.note("module syntax");
        n.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_each_construct_once() {
        let found = later_syntax("const a = () => 1;\nconst b = () => `x`;\nvar c = 2 ** 2;\n");
        assert_eq!(
            found,
            vec!["const", "arrow function", "template literal", "exponent operator"]
        );
    }

    #[test]
    fn plain_es5_is_clean() {
        assert!(later_syntax("var a = function (x) { return x + 1; };\n").is_empty());
    }
}
