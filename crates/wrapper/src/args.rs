//! Argument classification: is this a compilable translation unit, and if so,
//! what source/output/include/define/pass-through args does it carry?

const SOURCE_EXTENSIONS: [&str; 6] = [".c", ".cpp", ".cc", ".cxx", ".m", ".mm"];

fn looks_like_source(arg: &str) -> bool {
    !arg.starts_with('-') && SOURCE_EXTENSIONS.iter().any(|ext| arg.ends_with(ext))
}

/// True if `args` contains `-c` and at least one argument that is not a flag
/// and ends in one of the known source extensions.
pub fn is_compile_job(args: &[String]) -> bool {
    args.iter().any(|a| a == "-c") && args.iter().any(|a| looks_like_source(a))
}

/// A classified compile invocation: everything the dispatcher needs, plus the
/// args a local fallback would need to reproduce the exact same command.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileInvocation {
    pub source: String,
    pub output: String,
    pub include_paths: Vec<String>,
    pub defines: Vec<String>,
    pub other_args: Vec<String>,
}

/// Classify an already-confirmed compile job's arguments. Returns `None` if no
/// source file could be identified (caller falls through to local execution).
pub fn classify(args: &[String]) -> Option<CompileInvocation> {
    let mut source: Option<String> = None;
    let mut output: Option<String> = None;
    let mut include_paths = Vec::new();
    let mut defines = Vec::new();
    let mut other_args = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if arg == "-o" {
            output = args.get(i + 1).cloned();
            i += 2;
        } else if arg == "-c" {
            i += 1;
        } else if arg == "-I" {
            if let Some(v) = args.get(i + 1) {
                include_paths.push(v.clone());
            }
            i += 2;
        } else if let Some(rest) = arg.strip_prefix("-I") {
            include_paths.push(rest.to_string());
            i += 1;
        } else if arg == "-D" {
            if let Some(v) = args.get(i + 1) {
                defines.push(v.clone());
            }
            i += 2;
        } else if let Some(rest) = arg.strip_prefix("-D") {
            defines.push(rest.to_string());
            i += 1;
        } else if looks_like_source(arg) {
            source = Some(arg.clone());
            i += 1;
        } else {
            other_args.push(arg.clone());
            i += 1;
        }
    }

    let source = source?;
    let output = output.unwrap_or_else(|| default_output_for(&source));

    Some(CompileInvocation {
        source,
        output,
        include_paths,
        defines,
        other_args,
    })
}

fn default_output_for(source: &str) -> String {
    match source.rsplit_once('.') {
        Some((stem, _ext)) => format!("{stem}.o"),
        None => format!("{source}.o"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn recognizes_a_compile_job() {
        assert!(is_compile_job(&args(&["-c", "main.c", "-O2"])));
    }

    #[test]
    fn link_only_invocation_is_not_a_compile_job() {
        assert!(!is_compile_job(&args(&["-o", "app", "main.o", "util.o"])));
    }

    #[test]
    fn compile_flag_without_a_source_argument_is_not_a_compile_job() {
        assert!(!is_compile_job(&args(&["-c"])));
    }

    #[test]
    fn classifies_includes_defines_and_output() {
        let invocation = classify(&args(&[
            "-I", "/usr/include", "-Ilocal", "-DDEBUG", "-DLEVEL=2", "-c", "main.c", "-o", "main.o", "-O2",
        ]))
        .unwrap();
        assert_eq!(invocation.source, "main.c");
        assert_eq!(invocation.output, "main.o");
        assert_eq!(invocation.include_paths, vec!["/usr/include", "local"]);
        assert_eq!(invocation.defines, vec!["DEBUG", "LEVEL=2"]);
        assert_eq!(invocation.other_args, vec!["-O2"]);
    }

    #[test]
    fn defaults_output_to_source_stem_with_o_extension() {
        let invocation = classify(&args(&["-c", "widget.cpp"])).unwrap();
        assert_eq!(invocation.output, "widget.o");
    }

    #[test]
    fn returns_none_when_no_source_file_is_present() {
        assert!(classify(&args(&["-c", "-O2"])).is_none());
    }
}
