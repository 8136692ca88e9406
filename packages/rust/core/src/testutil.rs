//! Fixtures shared by the stage and pipeline tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use libpack_shared::{LibpackError, Result};

use crate::toolchain::Toolchain;

pub(crate) fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "libpack-{label}-test-{}",
        uuid::Uuid::now_v7()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub(crate) fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

pub(crate) fn read(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative)).unwrap()
}

pub(crate) const BORDER_BOX_VUE: &str = "<template>\n  <div class=\"dv-border-box-1\" />\n</template>\n\n<script>\nexport default {\n  name: 'DvBorderBox1'\n}\n</script>\n\n<style lang=\"less\">\n.dv-border-box-1 {\n  position: relative;\n}\n</style>\n";

pub(crate) const DECORATION_VUE: &str = "<template>\n  <div class=\"dv-decoration-1\" />\n</template>\n\n<style lang=\"less\">\n@color: #fff;\n.dv-decoration-1 { color: @color; }\n</style>\n";

pub(crate) const PLAIN_VUE: &str = "<template>\n  <span>plain</span>\n</template>\n";

pub(crate) const ENTRYPOINT: &str = "export const version = '1.0.0'\n";

pub(crate) fn component_module(name: &str) -> String {
    format!(
        "import {name} from './src/main.vue'\n\nexport default function (Vue) {{\n  Vue.component({name}.name, {name})\n}}\n"
    )
}

/// A small component library source tree.
pub(crate) fn make_source_tree(root: &Path) {
    write(root, "index.js", ENTRYPOINT);
    write(root, "components/borderBox1/index.js", &component_module("BorderBox1"));
    write(root, "components/borderBox1/src/main.vue", BORDER_BOX_VUE);
    write(root, "components/decoration1/index.js", &component_module("Decoration1"));
    write(root, "components/decoration1/src/main.vue", DECORATION_VUE);
    write(root, "components/plainText/index.js", "export default {}\n");
    write(root, "components/plainText/src/main.vue", PLAIN_VUE);
    write(root, "util/index.js", "export function noop () {}\n");
}

/// Test double recording every external invocation.
///
/// `compile_style` copies the input to the output behind a marker comment.
#[derive(Default)]
pub(crate) struct FakeToolchain {
    pub compiles: AtomicUsize,
    pub bundles: Mutex<Vec<PathBuf>>,
    /// Compilation fails for inputs whose path contains this fragment.
    pub fail_compile_for: Option<String>,
    /// Bundling fails for this config.
    pub fail_bundle_for: Option<PathBuf>,
}

impl FakeToolchain {
    pub fn compile_count(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }

    pub fn bundle_calls(&self) -> Vec<PathBuf> {
        self.bundles.lock().unwrap().clone()
    }
}

impl Toolchain for FakeToolchain {
    async fn compile_style(&self, input: &Path, output: &Path) -> Result<()> {
        self.compiles.fetch_add(1, Ordering::SeqCst);

        if let Some(fragment) = &self.fail_compile_for {
            if input.to_string_lossy().contains(fragment.as_str()) {
                return Err(LibpackError::process("fake-lessc", "exited with status 1"));
            }
        }

        let source = tokio::fs::read_to_string(input)
            .await
            .map_err(|e| LibpackError::io(input, e))?;
        tokio::fs::write(output, format!("/* compiled */\n{source}"))
            .await
            .map_err(|e| LibpackError::io(output, e))
    }

    async fn bundle(&self, config: &Path) -> Result<()> {
        self.bundles.lock().unwrap().push(config.to_path_buf());

        if self.fail_bundle_for.as_deref() == Some(config) {
            return Err(LibpackError::process("fake-rollup", "exited with status 1"));
        }
        Ok(())
    }
}
