//! Token generation for one suite manifest.

use std::path::Path;

use proc_macro2::TokenStream;
use quote::quote;

use super::{EmitError, EmitOptions};
use crate::manifest::{DeclNode, GroupDecl, SuiteManifest, TestDecl};
use crate::suite::Expectation;

pub(super) struct SuiteEmitter<'a> {
    manifest: &'a SuiteManifest,
    runner: syn::Path,
    harness_crate: syn::Ident,
    absolute_root: bool,
}

impl<'a> SuiteEmitter<'a> {
    pub(super) fn new(manifest: &'a SuiteManifest, options: &EmitOptions) -> Result<Self, EmitError> {
        let runner = syn::parse_str::<syn::Path>(&options.runner).map_err(|_| EmitError::InvalidPath {
            option: "runner",
            value: options.runner.clone(),
        })?;
        let harness_crate = syn::parse_str::<syn::Ident>(&options.harness_crate).map_err(|_| EmitError::InvalidPath {
            option: "harness_crate",
            value: options.harness_crate.clone(),
        })?;
        let absolute_root = manifest.root.starts_with('/') || Path::new(&manifest.root).is_absolute();
        Ok(Self {
            manifest,
            runner,
            harness_crate,
            absolute_root,
        })
    }

    pub(super) fn emit(&self) -> Result<TokenStream, EmitError> {
        let root = self.root_expr();
        let pattern = &self.manifest.pattern;
        let backend = self.manifest.backend.as_str();
        let excluded = self.manifest.exclusions.to_strings();
        let suite = self.emit_group(&self.manifest.suite, 1)?;

        Ok(quote! {
            pub const FIXTURE_ROOT: &str = #root;
            pub const FIXTURE_PATTERN: &str = #pattern;
            pub const BACKEND: &str = #backend;
            pub const EXCLUDED: &[&str] = &[#(#excluded),*];

            #suite
        })
    }

    /// `depth` is the number of `super::` hops from the group's module back to the file's top level.
    fn emit_group(&self, group: &GroupDecl, depth: usize) -> Result<TokenStream, EmitError> {
        let ident = parse_ident(&group.ident)?;
        let supers: TokenStream = (0..depth).map(|_| quote!(super::)).collect();
        let harness_crate = &self.harness_crate;
        let scope = group.path.as_str();
        let recorded: Vec<String> = group.recorded_paths().iter().map(ToString::to_string).collect();

        let mut body = vec![quote! {
            #[test]
            fn all_files_present() {
                ::#harness_crate::harness::assert_all_files_present(
                    #supers FIXTURE_ROOT,
                    #supers FIXTURE_PATTERN,
                    #scope,
                    &[#(#recorded),*],
                    #supers EXCLUDED,
                );
            }
        }];
        for child in &group.children {
            body.push(match child {
                DeclNode::Group(child) => self.emit_group(child, depth + 1)?,
                DeclNode::Test(test) => self.emit_test(test, &supers)?,
            });
        }

        Ok(quote! {
            pub mod #ident {
                #(#body)*
            }
        })
    }

    fn emit_test(&self, test: &TestDecl, supers: &TokenStream) -> Result<TokenStream, EmitError> {
        let ident = parse_ident(&test.ident)?;
        let runner = &self.runner;
        let fixture = test.fixture.as_str();
        let should_panic = match test.expectation {
            Expectation::Pass => TokenStream::new(),
            Expectation::Fail => quote!(#[should_panic]),
        };

        Ok(quote! {
            #[test]
            #should_panic
            fn #ident() {
                #runner(#supers FIXTURE_ROOT, #fixture, #supers BACKEND);
            }
        })
    }

    /// Expression for the fixture root directory.
    fn root_expr(&self) -> TokenStream {
        let root = match self.manifest.root.trim_end_matches('/') {
            "" if self.absolute_root => "/",
            "" => ".",
            trimmed => trimmed,
        };
        if self.absolute_root {
            quote!(#root)
        } else {
            quote!(concat!(env!("CARGO_MANIFEST_DIR"), "/", #root))
        }
    }
}

fn parse_ident(ident: &str) -> Result<syn::Ident, EmitError> {
    syn::parse_str::<syn::Ident>(ident).map_err(|_| EmitError::InvalidIdent {
        ident: ident.to_string(),
    })
}
