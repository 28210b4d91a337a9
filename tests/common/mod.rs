//! Common test utilities for buildrun tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Stand-in compiler driver
///
/// `-c` copies each `<name>.c` to `<name>.o`. Otherwise it links by writing
/// a shell script to the `-o` target made of the objects' contents, so a
/// source of `echo "from a"` becomes a program printing `from a`. A source
/// containing `LINK_FAIL` makes the link fail with an undefined reference,
/// `WARN` makes compiling it print one warning, and `NOISY` makes it print
/// thousands. Every call is appended to `invocations.log` next to the script.
pub const FAKE_COMPILER: &str = r#"#!/bin/sh
log="$(dirname "$0")/invocations.log"
echo "$*" >> "$log"

if [ "$1" = "-c" ]; then
    shift
    for src in "$@"; do
        case "$src" in
            -*) continue ;;
        esac
        if [ ! -f "$src" ]; then
            echo "fakecc: error: $src: No such file or directory" >&2
            exit 1
        fi
        if grep -q WARN "$src"; then
            echo "$src:2:5: warning: unused variable 'x'" >&2
        fi
        if grep -q NOISY "$src"; then
            i=0
            while [ $i -lt 5000 ]; do
                echo "$src:$i:1: warning: implicit conversion changes value" >&2
                i=$((i + 1))
            done
        fi
        cp "$src" "${src%.c}.o"
    done
    exit 0
fi

out=""
objs=""
while [ $# -gt 0 ]; do
    case "$1" in
        -o) out="$2"; shift 2 ;;
        -*) shift ;;
        *) objs="$objs $1"; shift ;;
    esac
done

if [ -z "$out" ]; then
    echo "fakecc: error: no output file" >&2
    exit 1
fi

for obj in $objs; do
    if [ ! -f "$obj" ]; then
        echo "fakecc: error: $obj: No such file or directory" >&2
        exit 1
    fi
    if grep -q LINK_FAIL "$obj"; then
        echo "$obj:(.text+0x1a): undefined reference to \`ddep_read'" >&2
        exit 1
    fi
done

echo '#!/bin/sh' > "$out"
for obj in $objs; do
    cat "$obj" >> "$out"
done
chmod +x "$out"
"#;

/// Write an executable script to `path`
pub fn write_script(path: &Path, content: &str) {
    std::fs::write(path, content).expect("Failed to write script");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)
            .expect("Failed to get metadata")
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).expect("Failed to set permissions");
    }
}

/// Creates a temporary directory holding `sources` as (file name, content)
pub fn create_project(sources: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (name, content) in sources {
        std::fs::write(dir.path().join(name), content).expect("Failed to write source");
    }
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Installs the fake compiler under `<project>/tools/cc` and returns its path
pub fn install_fake_compiler(project: &Path) -> PathBuf {
    let tools = project.join("tools");
    std::fs::create_dir_all(&tools).expect("Failed to create tools dir");
    let compiler = tools.join("cc");
    write_script(&compiler, FAKE_COMPILER);
    compiler
}

/// Argument lines the fake compiler was called with, oldest first
pub fn read_invocations(compiler: &Path) -> Vec<String> {
    let log = compiler
        .parent()
        .expect("compiler has a parent directory")
        .join("invocations.log");
    std::fs::read_to_string(log)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Project with two modules printing one line each, and the fake compiler
pub fn create_two_module_project() -> (TempDir, PathBuf, PathBuf) {
    let (dir, path) = create_project(&[
        ("a.c", "echo \"from a\"\n"),
        ("b.c", "echo \"from b\"\n"),
    ]);
    let compiler = install_fake_compiler(&path);
    (dir, path, compiler)
}

/// Real C sources laid out like the ddep2bin project
pub const HELPERS_SOURCE: &str = r#"
int ddep_scale(int value) {
    return value * 2;
}
"#;

pub const MAIN_SOURCE: &str = r#"
#include <stdio.h>

int ddep_scale(int value);

int main(void) {
    printf("deposition: %d\n", ddep_scale(21));
    return 0;
}
"#;
