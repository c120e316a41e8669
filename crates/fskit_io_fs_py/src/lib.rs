use std::collections::BTreeMap;

use fskit_io_fs::file::touch;
use fskit_io_fs::{FsError, ReportSync, SpecFsPerms, copy_file, sync_tree};
use pyo3::exceptions::{PyFileNotFoundError, PyNotADirectoryError, PyOSError, PyValueError};
use pyo3::prelude::*;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "fskit.fs.sync_tree.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "ReportSync")]
#[derive(Debug, Clone)]
struct PyReportSync {
    #[pyo3(get)]
    cnt_dirs_created: u64,
    #[pyo3(get)]
    cnt_dirs_existing: u64,
    #[pyo3(get)]
    cnt_files_linked: u64,
    #[pyo3(get)]
    cnt_files_streamed: u64,
    #[pyo3(get)]
    cnt_files_unchanged: u64,
}

impl From<ReportSync> for PyReportSync {
    fn from(report_sync: ReportSync) -> Self {
        Self {
            cnt_dirs_created: report_sync.cnt_dirs_created,
            cnt_dirs_existing: report_sync.cnt_dirs_existing,
            cnt_files_linked: report_sync.cnt_files_linked,
            cnt_files_streamed: report_sync.cnt_files_streamed,
            cnt_files_unchanged: report_sync.cnt_files_unchanged,
        }
    }
}

impl PyReportSync {
    fn as_report(&self) -> ReportSync {
        ReportSync {
            cnt_dirs_created: self.cnt_dirs_created,
            cnt_dirs_existing: self.cnt_dirs_existing,
            cnt_files_linked: self.cnt_files_linked,
            cnt_files_streamed: self.cnt_files_streamed,
            cnt_files_unchanged: self.cnt_files_unchanged,
        }
    }
}

#[pymethods]
impl PyReportSync {
    #[getter]
    fn file_count(&self) -> u64 {
        self.as_report().file_count()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.as_report().to_dict()
    }

    #[pyo3(signature = (prefix = "[SYNC]"))]
    fn format(&self, prefix: &str) -> String {
        self.as_report().format(prefix)
    }

    fn __str__(&self) -> String {
        self.as_report().to_string()
    }
}

fn map_fs_error(exception: FsError) -> PyErr {
    let message = exception.to_string();
    match exception {
        FsError::NotFound { .. } => PyFileNotFoundError::new_err(message),
        FsError::NotDirectory { .. } => PyNotADirectoryError::new_err(message),
        FsError::DestinationInsideSource { .. } => PyValueError::new_err(message),
        _ => PyOSError::new_err(message),
    }
}

#[pyfunction(name = "sync_tree")]
#[pyo3(signature = (dir_source, dir_destination))]
fn sync_tree_py(
    py: Python<'_>,
    dir_source: String,
    dir_destination: String,
) -> PyResult<PyReportSync> {
    let report_sync = py.allow_threads(|| sync_tree(dir_source, dir_destination));
    let report_sync = report_sync.map_err(map_fs_error)?;
    Ok(PyReportSync::from(report_sync))
}

#[pyfunction(name = "copy_file")]
#[pyo3(signature = (file_source, file_destination))]
fn copy_file_py(py: Python<'_>, file_source: String, file_destination: String) -> PyResult<String> {
    let enum_outcome = py.allow_threads(|| copy_file(file_source, file_destination));
    let enum_outcome = enum_outcome.map_err(map_fs_error)?;
    Ok(enum_outcome.as_str().to_string())
}

#[pyfunction(name = "touch")]
#[pyo3(signature = (path, perms_file = 0o644, perms_dir = 0o755))]
fn touch_py(py: Python<'_>, path: String, perms_file: u32, perms_dir: u32) -> PyResult<()> {
    let perms = SpecFsPerms {
        perms_dir,
        perms_file,
    };
    py.allow_threads(|| touch(path, perms)).map_err(map_fs_error)
}

#[pymodule]
fn _fskit_io_fs_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyReportSync>()?;
    module.add_function(wrap_pyfunction!(sync_tree_py, module)?)?;
    module.add_function(wrap_pyfunction!(copy_file_py, module)?)?;
    module.add_function(wrap_pyfunction!(touch_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
