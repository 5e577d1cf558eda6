use crate::{ location_here,
             runtime::{ data_structures::{ value::Value,
                                           word::{ NativeHandler,
                                                   WordRuntime } },
                        error::{ self,
                                 kind_error,
                                 ErrorKind },
                        interpreter::Interpreter } };
use std::sync::Arc;



/// A host function exposed to scripts.  It receives its arguments deepest first and returns the
/// values to push, in push order.
pub type PluginFunction = dyn Fn(&[Value]) -> error::Result<Vec<Value>> + Send + Sync;



/// Register a host function as a word.  The word pops `arity` values, passes them to the function
/// with the deepest value first, and pushes whatever the function returns.
pub fn register_plugin_word<F>(interpreter: &mut dyn Interpreter, name: &str, arity: usize, function: F)
    where
        F: Fn(&[Value]) -> error::Result<Vec<Value>> + Send + Sync + 'static
{
    let function: Arc<PluginFunction> = Arc::new(function);
    let handler: Arc<NativeHandler> = Arc::new(move |interpreter: &mut dyn Interpreter|
        {
            if interpreter.stack().len() < arity
            {
                return kind_error(interpreter,
                                  ErrorKind::StackUnderflow,
                                  format!("Stack underflow, {} values needed.", arity));
            }

            let mut arguments = Vec::with_capacity(arity);

            for _ in 0..arity
            {
                arguments.push(interpreter.pop()?);
            }

            arguments.reverse();

            for value in function(&arguments)?
            {
                interpreter.push(value);
            }

            Ok(())
        });

    let location = location_here!();

    interpreter.add_word(location.path().clone(),
                         location.line(),
                         location.column(),
                         name.to_string(),
                         handler,
                         format!("Host function taking {} values.", arity),
                         String::new(),
                         WordRuntime::Normal);
}
