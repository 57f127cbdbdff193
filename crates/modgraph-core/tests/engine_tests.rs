//! End-to-end engine tests driven by scan documents

use modgraph_core::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::path::Path;

/// Parse a scan document, defaulting its group to the file stem
fn scan(name: &str, text: &str) -> ScanFile {
    let path = Path::new(name);
    let mut scan = ScanFile::parse(path, text).unwrap();
    if scan.group.is_none() {
        scan.group = path.file_stem().map(|s| s.to_string_lossy().into_owned());
    }
    scan
}

fn load(scans: &[ScanFile]) -> Result<Registry> {
    let mut loader = RegistryLoader::new();
    for scan in scans {
        loader.add_scan(scan)?;
    }
    loader.load()
}

fn render(registry: &Registry, options: &AnalysisOptions, kind: ReportKind) -> String {
    Analyzer::new(registry, options).run(kind).unwrap().report.to_string()
}

const PACKAGES: &str = r#"
group = "ahoj"

[[module]]
source = "withoutPkgs.jar"
code-name = "my.module/3"
packages = ["", "is", "is/too"]

[[module]]
source = "withPkgs.jar"
code-name = "my.another.module/3"
public-packages = "is.there.*, is.recursive.**"
packages = ["is/there", "not/there", "is/recursive", "is/recursive/sub"]

[[module]]
source = "allPkgs.jar"
code-name = "my.very.public.module/10"
public-packages = "-"
packages = ["not/very", "not/very/sub"]
"#;

// ============================================================================
// Loading
// ============================================================================

mod loading {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_code_base_fails_in_either_order() {
        let first = scan("a.toml", "[[module]]\nsource = \"a.jar\"\ncode-name = \"dup/1\"\n");
        let second = scan("b.toml", "[[module]]\nsource = \"b.jar\"\ncode-name = \"dup/2\"\n");

        for order in [[&first, &second], [&second, &first]] {
            let err = load(&[order[0].clone(), order[1].clone()]).unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains("a.jar"), "{msg}");
            assert!(msg.contains("b.jar"), "{msg}");
        }
    }

    #[test]
    fn test_malformed_dependency_names_module_and_token() {
        let bad = scan(
            "s.toml",
            "[[module]]\ncode-name = \"my.module\"\nmodule-dependencies = \"org.openide/x\"\n",
        );
        let err = load(&[bad]).unwrap_err();
        assert!(matches!(err, ModgraphError::MalformedDependency { .. }));
        let msg = err.to_string();
        assert!(msg.contains("my.module") && msg.contains("org.openide/x"));
    }

    #[test]
    fn test_unprovided_requires_fails_before_any_report() {
        let err = load(&[scan(
            "s.toml",
            "[[module]]\ncode-name = \"m\"\nrequires = \"cap.missing\"\n",
        )])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsatisfied dependency 'cap.missing' required by m"
        );
    }

    #[test]
    fn test_special_and_recommended_tokens_need_no_provider() {
        let registry = load(&[scan(
            "s.toml",
            "[[module]]\ncode-name = \"m\"\nrequires = \"org.openide.modules.os.Unix\"\nrecommends = \"cap.optional\"\n",
        )]);
        assert!(registry.is_ok());
    }

    #[test]
    fn test_unused_pattern_is_fatal() {
        let bad = scan(
            "s.toml",
            "[[module]]\ncode-name = \"m\"\npublic-packages = \"x.y.*\"\npackages = [\"x\"]\n",
        );
        assert!(matches!(
            load(&[bad]),
            Err(ModgraphError::UndeclaredPackage { .. })
        ));
    }
}

// ============================================================================
// Resolution
// ============================================================================

mod resolution {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> Registry {
        load(&[scan(
            "s.toml",
            r#"
[[module]]
code-name = "lib.three/3"

[[module]]
code-name = "lib.five/5"
provides = "cap.shared"

[[module]]
code-name = "lib.one/1"
provides = "cap.shared"
"#,
        )])
        .unwrap()
    }

    fn direct(token: &str) -> Dependency {
        Dependency::parse("t", token, DependencyKind::Direct, &SpecialTokens::default()).unwrap()
    }

    #[test]
    fn test_range_matching() {
        let registry = registry();
        let resolver = registry.resolver();

        assert_eq!(resolver.candidates(&direct("lib.three/2-4")).len(), 1);
        assert!(resolver.candidates(&direct("lib.five/2-4")).is_empty());
        assert!(resolver.candidates(&direct("lib.one/2-4")).is_empty());
    }

    #[test]
    fn test_all_providers_returned() {
        let registry = registry();
        let dep = Dependency::parse("t", "cap.shared", DependencyKind::Requires, &SpecialTokens::default())
            .unwrap();
        let names: Vec<String> = registry
            .resolver()
            .resolve(&dep)
            .unwrap()
            .into_iter()
            .map(|m| m.code_base.clone())
            .collect();
        assert_eq!(names, vec!["lib.five", "lib.one"]);
    }
}

// ============================================================================
// Package reports
// ============================================================================

mod packages {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_public_packages() {
        let registry = load(&[scan("ahoj.toml", PACKAGES)]).unwrap();
        assert_eq!(
            render(&registry, &AnalysisOptions::default(), ReportKind::PublicPackages),
            "is\nis.recursive\nis.recursive.sub\nis.there\nis.too\n"
        );
    }

    #[test]
    fn test_recursive_export_sample() {
        let registry = load(&[scan(
            "s.toml",
            "[[module]]\ncode-name = \"m\"\npublic-packages = \"a.b.*, a.c.**\"\npackages = [\"a/b\", \"a/b/c\", \"a/c\", \"a/c/d\"]\n",
        )])
        .unwrap();
        let module = registry.get("m").unwrap();
        let exported = classify(module, registry.packages_of("m").unwrap());
        let expected: BTreeSet<String> = ["a/b", "a/c", "a/c/d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(exported, expected);
    }

    #[test]
    fn test_class_path_packages_are_public() {
        let registry = load(&[scan(
            "s.toml",
            r#"
[[module]]
code-name = "my.module/3"
packages = ["is"]
class-path = ["ext/not-a-module.jar"]

[[library]]
name = "ext/not-a-module.jar"
packages = ["is/cp"]
"#,
        )])
        .unwrap();
        assert_eq!(
            render(&registry, &AnalysisOptions::default(), ReportKind::PublicPackages),
            "is\nis.cp\n"
        );
    }

    #[test]
    fn test_group_friend_packages_with_limit() {
        let base = scan(
            "base.toml",
            r#"
[[module]]
code-name = "my.another.module/3"
public-packages = "friend.there.*, friend.recursive.**"
friends = "my.very.public.module, my.module"
packages = ["friend/there", "not/there", "friend/recursive", "friend/recursive/sub"]
"#,
        );
        let extra = scan(
            "extra.toml",
            r#"
[[module]]
code-name = "my.module/3"
friends = "my.very.public.module"
packages = ["just/friend"]

[[module]]
code-name = "my.very.public.module/10"
public-packages = "-"
packages = ["not/very"]
"#,
        );
        let registry = load(&[base, extra]).unwrap();

        let options = AnalysisOptions {
            max_friends: Some(1),
            ..Default::default()
        };
        let outcome = Analyzer::new(&registry, &options)
            .run(ReportKind::GroupFriendPackages)
            .unwrap();

        assert_eq!(
            outcome.report.to_string(),
            "MODULE my.another.module (base)\n\
             \x20 FRIEND my.module (extra)\n\
             \x20 FRIEND my.very.public.module (extra)\n\
             \x20 WARNING: excessive number of intercluster friends (2)\n\
             \x20 PACKAGE friend.recursive\n\
             \x20 PACKAGE friend.recursive.sub\n\
             \x20 PACKAGE friend.there\n"
        );
        assert_eq!(
            outcome
                .diagnostics
                .of_kind(DiagnosticKind::ExcessiveFriends)
                .count(),
            1
        );
    }

    #[test]
    fn test_external_friends_counted() {
        let registry = load(&[scan(
            "base.toml",
            r#"
[[module]]
code-name = "my.another.module/3"
public-packages = "friend.there.*"
friends = "my.very.public.module, my.module"
packages = ["friend/there"]
"#,
        )])
        .unwrap();
        let options = AnalysisOptions {
            max_friends: Some(1),
            ..Default::default()
        };
        assert_eq!(
            render(&registry, &options, ReportKind::GroupFriendPackages),
            "MODULE my.another.module (base)\n\
             \x20 EXTERNAL my.module\n\
             \x20 EXTERNAL my.very.public.module\n\
             \x20 WARNING: excessive number of intercluster friends (2)\n\
             \x20 PACKAGE friend.there\n"
        );
    }
}

// ============================================================================
// Module and dependency reports
// ============================================================================

mod listings {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_modules_sorted_with_major() {
        let registry = load(&[scan("ahoj.toml", PACKAGES)]).unwrap();
        assert_eq!(
            render(&registry, &AnalysisOptions::default(), ReportKind::Modules),
            "MODULE my.another.module/3 (ahoj)\n\
             MODULE my.module/3 (ahoj)\n\
             MODULE my.very.public.module/10 (ahoj)\n"
        );
    }

    #[test]
    fn test_generate_limits_reported_groups() {
        let registry = load(&[scan("ahoj.toml", PACKAGES)]).unwrap();
        let options = AnalysisOptions {
            generate: Some(BTreeSet::from(["elsewhere".to_string()])),
            ..Default::default()
        };
        assert_eq!(render(&registry, &options, ReportKind::Modules), "");
    }

    #[test]
    fn test_name_without_major_has_no_slash() {
        let registry = load(&[scan("g.toml", "[[module]]\ncode-name = \"my.module\"\n")]).unwrap();
        assert_eq!(
            render(&registry, &AnalysisOptions::default(), ReportKind::Modules),
            "MODULE my.module (g)\n"
        );
    }

    #[test]
    fn test_group_dependencies_across_scans() {
        let platform = scan(
            "platform.toml",
            "[[module]]\ncode-name = \"org.openide/1\"\n",
        );
        let ide = scan(
            "ide.toml",
            "[[module]]\ncode-name = \"ide.editor\"\ngroup = \"ide\"\nmodule-dependencies = \"org.openide/1 > 4.17\"\n",
        );
        let registry = load(&[platform, ide]).unwrap();

        assert_eq!(
            render(&registry, &AnalysisOptions::default(), ReportKind::GroupDependencies),
            "GROUP ide\n  REQUIRES org.openide/1 (platform)\n"
        );
    }
}

// ============================================================================
// Graph analyses
// ============================================================================

mod analyses {
    use super::*;
    use pretty_assertions::assert_eq;

    const KITS: &str = r#"
group = "g"

[[module]]
code-name = "k1"
show-in-autoupdate = true
module-dependencies = "m"

[[module]]
code-name = "k2"
show-in-autoupdate = true
module-dependencies = "k1, m"

[[module]]
code-name = "m"
"#;

    #[test]
    fn test_kit_containment_sample() {
        let registry = load(&[scan("g.toml", KITS)]).unwrap();
        assert_eq!(
            render(&registry, &AnalysisOptions::default(), ReportKind::Kits),
            "KIT k1 (g)\n  MODULE m (g)\nKIT k2 (g)\n"
        );
    }

    #[test]
    fn test_kit_dependency_listing() {
        let registry = load(&[scan("g.toml", KITS)]).unwrap();
        insta::assert_snapshot!(
            render(&registry, &AnalysisOptions::default(), ReportKind::Dependencies),
            @r"
        MODULE k1 (g)
          REQUIRES m (g)
        MODULE k2 (g)
          REQUIRES k1 (g)
          REQUIRES m (g)
        "
        );
    }

    #[test]
    fn test_disabled_autoload_sample() {
        let only_autoloads = scan(
            "libs.toml",
            r#"
[[module]]
code-name = "a"
autoload = true

[[module]]
code-name = "b"
autoload = true
requires = "cap.a"
"#,
        );
        let mut with_provider = only_autoloads.clone();
        with_provider.module[0].provides = Some("cap.a".to_string());

        let registry = load(&[with_provider.clone()]).unwrap();
        assert_eq!(
            render(&registry, &AnalysisOptions::default(), ReportKind::DisabledAutoloads),
            "GROUP libs\n  MODULE a\n  MODULE b\n"
        );

        let mut reached = with_provider;
        reached.module.push(ModuleFacts {
            module_dependencies: Some("b".to_string()),
            ..ModuleFacts::new("r")
        });
        let registry = load(&[reached]).unwrap();
        assert_eq!(
            render(&registry, &AnalysisOptions::default(), ReportKind::DisabledAutoloads),
            ""
        );
    }

    #[test]
    fn test_reverse_dependencies() {
        let registry = load(&[scan(
            "s.toml",
            r#"
[[module]]
code-name = "platform.core"
group = "platform"
module-dependencies = "ide.editor"

[[module]]
code-name = "ide.editor"
group = "ide"
module-dependencies = "platform.core"
"#,
        )])
        .unwrap();
        let options = AnalysisOptions {
            cluster_policy: ClusterPolicy::new().allow("ide", ["platform"]),
            ..Default::default()
        };
        assert_eq!(
            render(&registry, &options, ReportKind::ReverseDependencies),
            "platform.core -> ide.editor\n"
        );
    }

    #[test]
    fn test_special_token_exclusion() {
        let registry = load(&[scan(
            "s.toml",
            r#"
[[module]]
code-name = "platform.core"
group = "platform"
requires = "org.openide.modules.os.MacOSX"
module-dependencies = "org.openide.modules.ModuleFormat2"
"#,
        )])
        .unwrap();
        let options = AnalysisOptions::default();
        let analyzer = Analyzer::new(&registry, &options);

        let module = registry.get("platform.core").unwrap();
        for dep in &module.depends_on {
            assert!(dep.special);
            assert!(registry.resolver().resolve(dep).unwrap().is_empty());
        }
        assert!(analyzer.run(ReportKind::ReverseDependencies).unwrap().report.is_empty());
        assert!(analyzer.run(ReportKind::GroupDependencies).unwrap().report.is_empty());
        assert!(analyzer.check().unwrap().is_empty());
    }

    #[test]
    fn test_check_fails_on_unsatisfied_direct() {
        let registry = load(&[scan(
            "s.toml",
            "[[module]]\ncode-name = \"m\"\nmodule-dependencies = \"lib.missing/2\"\n",
        )])
        .unwrap();
        let options = AnalysisOptions::default();
        let err = Analyzer::new(&registry, &options).check().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsatisfied dependency 'lib.missing/2' required by m"
        );
    }

    #[test]
    fn test_check_collects_warnings() {
        let registry = load(&[scan(
            "s.toml",
            "[[module]]\ncode-name = \"m\"\nrecommends = \"cap.optional\"\n",
        )])
        .unwrap();
        let options = AnalysisOptions::default();
        let warnings = Analyzer::new(&registry, &options).check().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings.iter().next().unwrap().kind,
            DiagnosticKind::UnresolvedRecommends
        );
    }

    #[test]
    fn test_closure_idempotent_on_module_graph() {
        let registry = load(&[scan("g.toml", KITS)]).unwrap();
        let mut adjacency = std::collections::BTreeMap::new();
        for module in registry.modules() {
            let targets: BTreeSet<String> = registry
                .resolver()
                .resolve_module(module, &mut Diagnostics::new())
                .unwrap()
                .into_iter()
                .map(|m| m.code_base.clone())
                .collect();
            adjacency.insert(module.code_base.clone(), targets);
        }
        transitive_closure(&mut adjacency);
        let once = adjacency.clone();
        transitive_closure(&mut adjacency);
        assert_eq!(adjacency, once);
        assert!(once["k2"].contains("m"));
    }
}
