use modelcheck_core::Schema;

use crate::cmd::{load_registry, ModelsArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_models, OutputFormat};

pub fn run(args: ModelsArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(&args.schemas, false)?;
    let schemas: Vec<_> = registry
        .names()
        .into_iter()
        .filter_map(|name| registry.get(name))
        .collect();
    let refs: Vec<&Schema> = schemas.iter().map(|schema| &**schema).collect();

    print_models(&refs, format);
    Ok(SUCCESS)
}
