use std::{ fs::read_to_string,
           sync::Arc };
use crate::{ lang::{ code::{ Action,
                             ActionList,
                             CaseBranch },
                     compilation::{ Definition,
                                    DefinitionKind },
                     source_buffer::{ SourceBuffer,
                                      SourceLocation },
                     tokenizing::{ self,
                                   parse_number,
                                   Token } },
             runtime::{ built_ins::{ block_words::BlockManager,
                                     io_words::{ StdIo,
                                                 TextIo } },
                        data_structures::{ contextual_data::ContextualData,
                                           dictionary::Dictionary,
                                           local_scopes::LocalScopes,
                                           task::TaskHandle,
                                           value::Value,
                                           word::{ NativeHandler,
                                                   Word,
                                                   WordBody,
                                                   WordRef,
                                                   WordRuntime } },
                        error::{ self,
                                 code_error,
                                 kind_error,
                                 script_error,
                                 ErrorKind,
                                 ScriptError,
                                 ABORT_QUOTE_CODE,
                                 INVALID_ADDRESS_CODE,
                                 RETURN_STACK_OVERFLOW_CODE },
                        interpreter::{ CallItem,
                                       CallStack,
                                       ChildSeed,
                                       CodeManagement,
                                       DataSpace,
                                       Flow,
                                       Interpreter,
                                       InterpreterStack,
                                       StackDepths,
                                       ThreadManagement,
                                       ValueStack,
                                       WordManagement } } };
use arcstr::ArcStr;



/// How deeply word calls and the bodies of control structures may nest before the interpreter
/// gives up with a return stack overflow.  Every level costs native stack, the limit fits in the
/// 2 MiB stack a spawned thread gets by default.
pub const MAX_NESTING_DEPTH: usize = 256;

/// The data space address holding the numeric base.
pub const BASE_ADDRESS: usize = 0;



/// The interpreter for the language.
///
/// Source text is evaluated a token at a time.  Words are either executed or, in compile state,
/// appended to the definition under construction.  Immediate words always execute and that is
/// how every defining and control word gets its compile time behavior.
pub struct ForthInterpreter
{
    /// The data stack.
    stack: ValueStack,

    /// Values moved out of the way with `>R`.
    return_stack: ValueStack,

    /// The indices of the `DO` loops currently running, innermost last.
    loop_indices: Vec<i64>,

    /// The locals of the compiled words currently executing.
    locals: LocalScopes,

    /// The compiled words currently executing, innermost last.  `RECURSE` calls the last one.
    executing: Vec<WordRef>,

    /// The last known location execution has reached in the original source code.
    current_location: Option<SourceLocation>,

    /// The call stack used to report where errors happened.
    call_stack: CallStack,

    /// Word calls and control structure bodies currently running.
    nesting: usize,

    /// The words known to the interpreter.
    dictionary: Dictionary,

    /// The data space, cell 0 holds the numeric base.
    memory: Vec<Value>,

    /// The source texts being evaluated.  `EVALUATE` and `LOAD` push onto this while the text
    /// that called them waits.
    inputs: Vec<SourceBuffer>,

    /// The payload of the quoting word being executed.
    payload: Option<String>,

    /// Are we in compile state?
    compiling: bool,

    /// The definition under construction.
    definition: Option<Definition>,

    io: Arc<dyn TextIo>,

    block_manager: Option<Arc<dyn BlockManager>>
}


impl ContextualData for ForthInterpreter
{
    fn mark_context(&mut self)
    {
        self.locals.mark_context();
    }

    fn release_context(&mut self)
    {
        self.locals.release_context();
    }
}


impl InterpreterStack for ForthInterpreter
{
    fn stack(&self) -> &ValueStack
    {
        &self.stack
    }

    fn push(&mut self, value: Value)
    {
        self.stack.push(value);
    }

    fn pop(&mut self) -> error::Result<Value>
    {
        match self.stack.pop()
        {
            Some(value) => Ok(value),
            None => kind_error(self, ErrorKind::StackUnderflow, "Stack underflow.".to_string())
        }
    }

    fn pop_as_int(&mut self) -> error::Result<i64>
    {
        let value = self.pop()?;
        value.as_int(self).copied()
    }

    fn pop_as_usize(&mut self) -> error::Result<usize>
    {
        let value = self.pop_as_int()?;

        if value < 0
        {
            return kind_error(self,
                              ErrorKind::TypeError,
                              format!("Expected a non-negative integer, found {}.", value));
        }

        Ok(value as usize)
    }

    fn pop_as_float(&mut self) -> error::Result<f64>
    {
        let value = self.pop()?;
        value.as_float(self).copied()
    }

    fn pop_as_bool(&mut self) -> error::Result<bool>
    {
        Ok(self.pop_as_int()? != 0)
    }

    fn pop_as_string(&mut self) -> error::Result<ArcStr>
    {
        let value = self.pop()?;
        value.as_string(self).cloned()
    }

    fn pop_as_word(&mut self) -> error::Result<WordRef>
    {
        let value = self.pop()?;
        value.as_word(self).cloned()
    }

    fn pop_as_task(&mut self) -> error::Result<TaskHandle>
    {
        let value = self.pop()?;
        value.as_task(self).cloned()
    }

    fn peek(&self, index: usize) -> error::Result<Value>
    {
        if index >= self.stack.len()
        {
            return kind_error(self, ErrorKind::StackUnderflow, "Stack underflow.".to_string());
        }

        Ok(self.stack[self.stack.len() - 1 - index].clone())
    }

    fn pick(&mut self, index: usize) -> error::Result<Value>
    {
        if index >= self.stack.len()
        {
            return kind_error(self, ErrorKind::StackUnderflow, "Stack underflow.".to_string());
        }

        let position = self.stack.len() - 1 - index;
        Ok(self.stack.remove(position))
    }

    fn clear_stack(&mut self)
    {
        self.stack.clear();
    }

    fn return_stack_push(&mut self, value: Value)
    {
        self.return_stack.push(value);
    }

    fn return_stack_pop(&mut self) -> error::Result<Value>
    {
        match self.return_stack.pop()
        {
            Some(value) => Ok(value),
            None => kind_error(self,
                               ErrorKind::StackUnderflow,
                               "Return stack underflow.".to_string())
        }
    }

    fn return_stack_peek(&self) -> error::Result<Value>
    {
        match self.return_stack.last()
        {
            Some(value) => Ok(value.clone()),
            None => kind_error(self,
                               ErrorKind::StackUnderflow,
                               "Return stack underflow.".to_string())
        }
    }

    fn loop_index(&self, depth: usize) -> error::Result<i64>
    {
        if depth >= self.loop_indices.len()
        {
            return kind_error(self,
                              ErrorKind::StackUnderflow,
                              format!("No loop {} levels out to read an index from.", depth + 1));
        }

        Ok(self.loop_indices[self.loop_indices.len() - 1 - depth])
    }
}


impl CodeManagement for ForthInterpreter
{
    fn next_token(&mut self) -> error::Result<Option<Token>>
    {
        match self.inputs.last_mut()
        {
            Some(buffer) => tokenizing::next_token(buffer),
            None => Ok(None)
        }
    }

    fn next_word(&mut self) -> error::Result<( SourceLocation, String )>
    {
        match self.next_token()?
        {
            Some(token) => Ok(( token.location().clone(), token.text().clone() )),
            None => kind_error(self,
                               ErrorKind::CompileError,
                               "Unexpected end of input, expected a word name.".to_string())
        }
    }

    fn parse_until(&mut self, delimiter: char) -> error::Result<( String, bool )>
    {
        match self.inputs.last_mut()
        {
            Some(buffer) => Ok(tokenizing::parse_until(buffer, delimiter)),
            None => Ok(( String::new(), false ))
        }
    }

    fn skip_line(&mut self)
    {
        if let Some(buffer) = self.inputs.last_mut()
        {
            buffer.skip_line();
        }
    }

    fn take_payload(&mut self) -> error::Result<String>
    {
        match self.payload.take()
        {
            Some(payload) => Ok(payload),
            None => script_error(self, "Quoting word used without its quoted text.".to_string())
        }
    }

    fn is_compiling(&self) -> bool
    {
        self.compiling
    }

    fn set_compiling(&mut self, compiling: bool)
    {
        self.compiling = compiling;
    }

    fn definition(&self) -> Option<&Definition>
    {
        self.definition.as_ref()
    }

    fn definition_mut(&mut self) -> error::Result<&mut Definition>
    {
        if self.definition.is_none()
        {
            return kind_error(self,
                              ErrorKind::CompileError,
                              "Not currently compiling a definition.".to_string());
        }

        self.definition
            .as_mut()
            .ok_or_else(|| ScriptError::new_with_kind(ErrorKind::CompileError,
                                                      None,
                                                      "Not currently compiling a definition."
                                                          .to_string(),
                                                      None))
    }

    fn begin_definition(&mut self,
                        kind: DefinitionKind,
                        location: SourceLocation) -> error::Result<()>
    {
        if let Some(definition) = &self.definition
        {
            let message = format!("Can't start a new definition inside of {}.", definition.name());
            return kind_error(self, ErrorKind::CompileError, message);
        }

        self.definition = Some(Definition::new(kind, location));
        self.compiling = true;

        Ok(())
    }

    fn end_definition(&mut self) -> error::Result<WordRef>
    {
        let definition = match self.definition.take()
            {
                Some(definition) if !definition.is_transient() => definition,

                other =>
                    {
                        self.definition = other;
                        return kind_error(self,
                                          ErrorKind::CompileError,
                                          "; without a matching : or :NONAME.".to_string());
                    }
            };

        self.compiling = false;

        let location = definition.location().clone();
        let ( kind, code ) = definition.finish()?;

        let name = match kind
            {
                DefinitionKind::Named(name) => Some(name),
                _ => None
            };

        let word = Word::new(name, location, WordBody::Compiled(Arc::new(code)));

        Ok(self.define_word(word))
    }

    fn open_structure(&mut self) -> error::Result<&mut Definition>
    {
        if self.definition.is_none()
        {
            let location = self.current_location.clone().unwrap_or_default();

            self.definition = Some(Definition::new(DefinitionKind::Transient, location));
            self.compiling = true;
        }
        else if !self.compiling
        {
            return kind_error(self,
                              ErrorKind::CompileError,
                              "Control structures can't be interpreted inside of a definition."
                                  .to_string());
        }

        self.definition_mut()
    }

    fn structure_closed(&mut self) -> error::Result<()>
    {
        let finished = self.definition
                           .as_ref()
                           .is_some_and(|definition|    definition.is_transient()
                                                     && !definition.has_open_frames());

        if !finished
        {
            return Ok(());
        }

        let Some(mut definition) = self.definition.take()
        else
        {
            return Ok(());
        };

        self.compiling = false;

        let code = definition.take_code();
        let word: WordRef = Arc::new(Word::new(None,
                                               definition.location().clone(),
                                               WordBody::Compiled(Arc::new(code))));
        let location = self.current_location.clone().unwrap_or_default();

        self.execute_word(&location, &word)
    }

    fn compile_action(&mut self, action: Action) -> error::Result<()>
    {
        self.definition_mut()?.push_action(action);
        Ok(())
    }

    fn process_source_file(&mut self, path: &str) -> error::Result<()>
    {
        let source = read_to_string(path)
            .map_err(|error| ScriptError::new(None,
                                              format!("Could not read {}: {}", path, error),
                                              None))?;

        self.process_source(path, &source)
    }

    fn process_source(&mut self, path: &str, source: &str) -> error::Result<()>
    {
        let top_level = self.inputs.is_empty() && self.call_stack.is_empty();

        self.inputs.push(SourceBuffer::new(path, source));

        let result = self.evaluate_input();

        let _ = self.inputs.pop();

        if top_level
        {
            self.payload = None;

            if result.is_err()
            {
                self.recover();
            }
        }

        result
    }

    fn run_actions(&mut self, actions: &ActionList) -> error::Result<Flow>
    {
        for action in actions.iter()
        {
            let flow = self.run_action(action)?;

            if flow != Flow::Continue
            {
                return Ok(flow);
            }
        }

        Ok(Flow::Continue)
    }
}


impl WordManagement for ForthInterpreter
{
    fn current_location(&self) -> &Option<SourceLocation>
    {
        &self.current_location
    }

    fn add_word(&mut self,
                file: String,
                line: usize,
                column: usize,
                name: String,
                handler: Arc<NativeHandler>,
                description: String,
                signature: String,
                runtime: WordRuntime)
    {
        let location = SourceLocation::new_from_info(&file, line, column);
        let word = Word::new(Some(name), location, WordBody::Native(handler))
            .with_runtime(runtime)
            .with_help(description, signature);

        let _ = self.define_word(word);
    }

    fn define_word(&mut self, word: Word) -> WordRef
    {
        let word = Arc::new(word.with_namespace(self.dictionary.current().clone()));

        self.dictionary.define(word.clone());
        word
    }

    fn find_word(&self, name: &str) -> Option<WordRef>
    {
        self.dictionary.resolve(name)
    }

    fn resolve_word(&self, name: &str) -> error::Result<WordRef>
    {
        match self.dictionary.resolve(name)
        {
            Some(word) => Ok(word),
            None => kind_error(self, ErrorKind::UndefinedWord, format!("Word {} not found.", name))
        }
    }

    fn execute_word(&mut self, location: &SourceLocation, word: &WordRef) -> error::Result<()>
    {
        self.nested(|interpreter|
            {
                interpreter.call_stack_push(word.display_name(), location.clone());

                let result = interpreter.execute_body(location, word);

                let _ = interpreter.call_stack.pop();

                result
            })
    }

    fn execute_word_named(&mut self, location: &SourceLocation, word: &str) -> error::Result<()>
    {
        let word = self.resolve_word(word)?;
        self.execute_word(location, &word)
    }

    fn call_stack(&self) -> &CallStack
    {
        &self.call_stack
    }

    fn call_stack_push(&mut self, name: String, location: SourceLocation)
    {
        self.call_stack.push(CallItem::new(name, location));
    }

    fn dictionary(&self) -> &Dictionary
    {
        &self.dictionary
    }

    fn dictionary_mut(&mut self) -> &mut Dictionary
    {
        &mut self.dictionary
    }
}


impl DataSpace for ForthInterpreter
{
    fn here(&self) -> usize
    {
        self.memory.len()
    }

    fn allot(&mut self, cells: i64) -> error::Result<usize>
    {
        let start = self.memory.len();

        if cells >= 0
        {
            self.memory.resize(start + cells as usize, Value::Int(0));
            return Ok(start);
        }

        let released = cells.unsigned_abs() as usize;

        if released >= start
        {
            return code_error(self,
                              INVALID_ADDRESS_CODE,
                              format!("Can't release {} cells of data space.", released));
        }

        self.memory.truncate(start - released);
        Ok(self.memory.len())
    }

    fn comma(&mut self, value: Value) -> usize
    {
        self.memory.push(value);
        self.memory.len() - 1
    }

    fn fetch(&self, address: i64) -> error::Result<Value>
    {
        match usize::try_from(address).ok().and_then(|index| self.memory.get(index))
        {
            Some(value) => Ok(value.clone()),
            None => code_error(self,
                               INVALID_ADDRESS_CODE,
                               format!("Invalid memory address {}.", address))
        }
    }

    fn store(&mut self, address: i64, value: Value) -> error::Result<()>
    {
        let index = match usize::try_from(address)
            {
                Ok(index) if index < self.memory.len() => index,
                _ => return code_error(self,
                                       INVALID_ADDRESS_CODE,
                                       format!("Invalid memory address {}.", address))
            };

        self.memory[index] = value;
        Ok(())
    }

    fn base(&self) -> u32
    {
        match self.memory.get(BASE_ADDRESS)
        {
            Some(Value::Int(base)) if (2..=36).contains(base) => *base as u32,
            _ => 10
        }
    }

    fn truncate_data_space(&mut self, here: usize)
    {
        self.memory.truncate(here.max(BASE_ADDRESS + 1));
    }
}


impl ThreadManagement for ForthInterpreter
{
    fn child_seed(&self) -> ChildSeed
    {
        ChildSeed
            {
                snapshot: self.dictionary.snapshot(),
                memory: self.memory.clone(),
                io: self.io.clone(),
                block_manager: self.block_manager.clone()
            }
    }
}


impl Interpreter for ForthInterpreter
{
    fn io(&self) -> Arc<dyn TextIo>
    {
        self.io.clone()
    }

    fn block_manager(&self) -> Option<Arc<dyn BlockManager>>
    {
        self.block_manager.clone()
    }

    fn set_block_manager(&mut self, manager: Arc<dyn BlockManager>)
    {
        self.block_manager = Some(manager);
    }

    fn stack_depths(&self) -> StackDepths
    {
        StackDepths
            {
                data: self.stack.len(),
                return_stack: self.return_stack.len(),
                loops: self.loop_indices.len(),
                locals: self.locals.depth(),
                calls: self.call_stack.len(),
                executing: self.executing.len(),
                compiling: self.compiling,
                has_definition: self.definition.is_some()
            }
    }

    fn restore_depths(&mut self, depths: &StackDepths)
    {
        self.stack.resize(depths.data, Value::Int(0));
        self.return_stack.truncate(depths.return_stack);
        self.loop_indices.truncate(depths.loops);
        self.locals.truncate(depths.locals);
        self.call_stack.truncate(depths.calls);
        self.executing.truncate(depths.executing);

        if !depths.has_definition
        {
            self.definition = None;
        }

        self.compiling = depths.compiling;
    }

    fn reset(&mut self)
    {
        self.stack.clear();
        self.recover();
    }
}


impl ForthInterpreter
{
    /// Create an interpreter that talks to standard input and output.  The interpreter starts
    /// with an empty dictionary, the word sets are registered separately.
    pub fn new() -> ForthInterpreter
    {
        ForthInterpreter::with_io(Arc::new(StdIo))
    }

    /// Create an interpreter with the given text I/O.
    pub fn with_io(io: Arc<dyn TextIo>) -> ForthInterpreter
    {
        ForthInterpreter
            {
                stack: Vec::with_capacity(20),
                return_stack: Vec::new(),
                loop_indices: Vec::new(),
                locals: LocalScopes::new(),
                executing: Vec::new(),
                current_location: None,
                call_stack: CallStack::with_capacity(40),
                nesting: 0,
                dictionary: Dictionary::new(),
                memory: vec![ Value::Int(10) ],
                inputs: Vec::new(),
                payload: None,
                compiling: false,
                definition: None,
                io,
                block_manager: None
            }
    }

    /// Create a child interpreter from its parent's seed.  The child sees the dictionary exactly
    /// as it was when the seed was taken and gets its own copy of the data space.
    pub fn from_seed(seed: ChildSeed) -> ForthInterpreter
    {
        let mut interpreter = ForthInterpreter::with_io(seed.io);

        interpreter.dictionary = Dictionary::from_snapshot(&seed.snapshot);
        interpreter.memory = seed.memory;
        interpreter.block_manager = seed.block_manager;

        interpreter
    }

    /// Throw away the half finished state left behind by an error at the top level.  The data
    /// stack is kept for the host to inspect.
    fn recover(&mut self)
    {
        self.definition = None;
        self.compiling = false;
        self.payload = None;
        self.return_stack.clear();
        self.loop_indices.clear();
        self.locals.truncate(0);
        self.executing.clear();
        self.call_stack.clear();
    }

    /// The drive loop, evaluate tokens until the current input runs out.
    fn evaluate_input(&mut self) -> error::Result<()>
    {
        while let Some(token) = self.next_token()?
        {
            let location = token.location().clone();

            self.current_location = Some(location.clone());
            self.process_token(token).map_err(|error| error.with_location(Some(location)))?;
        }

        Ok(())
    }

    fn process_token(&mut self, token: Token) -> error::Result<()>
    {
        match token
        {
            Token::Word(location, text) => self.process_word(&location, &text),

            Token::Quoted(location, word, payload) =>
                {
                    self.payload = Some(payload);

                    let result = self.process_word(&location, &word);

                    self.payload = None;
                    result
                }
        }
    }

    /// Execute or compile one word, or failing that, a number.
    fn process_word(&mut self, location: &SourceLocation, text: &str) -> error::Result<()>
    {
        let is_local =    self.compiling
                       && self.definition.as_ref().is_some_and(|definition| definition.is_local(text));

        if is_local
        {
            return self.compile_action(Action::FetchLocal(text.to_uppercase()));
        }

        if let Some(word) = self.dictionary.resolve(text)
        {
            if self.compiling && !word.is_immediate()
            {
                return self.compile_action(Action::Call(word, location.clone()));
            }

            return self.execute_word(location, &word);
        }

        match parse_number(text, self.base())
        {
            Some(number) =>
                {
                    let value = Value::from(number);

                    if self.compiling
                    {
                        self.compile_action(Action::Push(value))
                    }
                    else
                    {
                        self.push(value);
                        Ok(())
                    }
                },

            None => kind_error(self, ErrorKind::UndefinedWord, format!("Word {} not found.", text))
        }
    }

    fn data_address(&self, word: &WordRef) -> error::Result<usize>
    {
        match word.data_address()
        {
            Some(address) => Ok(address),
            None => script_error(self, format!("Word {} has no data address.", word))
        }
    }

    fn execute_body(&mut self, location: &SourceLocation, word: &WordRef) -> error::Result<()>
    {
        match word.body()
        {
            WordBody::Native(handler) =>
                {
                    let handler = handler.clone();
                    (*handler)(self)
                },

            WordBody::Compiled(actions) => self.run_word_actions(word, actions),

            WordBody::Created =>
                {
                    let address = self.data_address(word)?;

                    self.push(Value::from(address));
                    Ok(())
                },

            WordBody::Does(actions) =>
                {
                    let address = self.data_address(word)?;

                    self.push(Value::from(address));
                    self.run_word_actions(word, actions)
                },

            WordBody::Constant(value) =>
                {
                    self.push(value.clone());
                    Ok(())
                },

            WordBody::Value =>
                {
                    let address = self.data_address(word)?;
                    let value = self.fetch(address as i64)?;

                    self.push(value);
                    Ok(())
                },

            WordBody::Deferred =>
                {
                    let address = self.data_address(word)?;

                    match self.fetch(address as i64)?
                    {
                        Value::Word(target) => self.execute_word(location, &target),
                        _ => script_error(self, format!("Deferred word {} has not been set.", word))
                    }
                },

            WordBody::Marker(snapshot, here) =>
                {
                    self.dictionary.restore(snapshot);
                    self.truncate_data_space(*here);
                    Ok(())
                }
        }
    }

    /// Run a compiled body with its own scope for locals.  `EXIT` ends up here.
    fn run_word_actions(&mut self, word: &WordRef, actions: &ActionList) -> error::Result<()>
    {
        self.executing.push(word.clone());
        self.mark_context();

        let result = self.run_actions(actions);

        self.release_context();
        let _ = self.executing.pop();

        result.map(|_| ())
    }

    /// Run a word call or a control structure body one level deeper, failing with a return
    /// stack overflow once the nesting limit is reached.
    fn nested<T>(&mut self,
                 body: impl FnOnce(&mut ForthInterpreter) -> error::Result<T>) -> error::Result<T>
    {
        if self.nesting >= MAX_NESTING_DEPTH
        {
            return code_error(self,
                              RETURN_STACK_OVERFLOW_CODE,
                              "Return stack overflow, calls and control structures nested too \
                               deeply.".to_string());
        }

        self.nesting += 1;

        let result = body(self);

        self.nesting -= 1;
        result
    }

    fn run_action(&mut self, action: &Action) -> error::Result<Flow>
    {
        match action
        {
            Action::Push(value) => self.push(value.clone()),

            Action::Call(word, location) =>
                {
                    self.current_location = Some(location.clone());
                    self.execute_word(location, word)?;
                },

            Action::Recurse => self.run_recurse()?,

            Action::CompileCall(word) =>
                {
                    let location = self.current_location.clone().unwrap_or_default();
                    self.compile_action(Action::Call(word.clone(), location))?;
                },

            Action::PrintText(text) => self.io.write_text(text)?,

            Action::AbortText(text) => return code_error(self, ABORT_QUOTE_CODE, text.to_string()),

            Action::If { then_branch, else_branch } =>
                return self.nested(|interpreter| interpreter.run_if(then_branch, else_branch)),

            Action::BeginUntil(body) =>
                return self.nested(|interpreter| interpreter.run_begin(body, None, true)),

            Action::BeginWhile { pre, mid } =>
                return self.nested(|interpreter| interpreter.run_begin(pre, Some(mid), false)),

            Action::BeginAgain(body) =>
                return self.nested(|interpreter| interpreter.run_begin(body, None, false)),

            Action::DoLoop { body, plus_loop, .. } =>
                return self.nested(|interpreter| interpreter.run_do_loop(body, *plus_loop)),

            Action::Case { branches, default } =>
                return self.nested(|interpreter| interpreter.run_case(branches, default)),

            Action::Leave => return Ok(Flow::Leave),
            Action::Exit => return Ok(Flow::Exit),

            Action::BindLocals(names) => self.bind_locals(names)?,

            Action::FetchLocal(name) => self.fetch_local(name)?,

            Action::StoreLocal(name) =>
                {
                    let value = self.pop()?;
                    self.store_local(name, value)?;
                },

            Action::StoreValue(_, address) =>
                {
                    let value = self.pop()?;
                    self.store(*address as i64, value)?;
                },

            Action::SetDeferred(_, address) =>
                {
                    let word = self.pop_as_word()?;
                    self.store(*address as i64, Value::Word(word))?;
                },

            Action::SetDoes(actions) =>
                {
                    self.set_does(actions)?;
                    return Ok(Flow::Exit);
                }
        }

        Ok(Flow::Continue)
    }

    fn run_recurse(&mut self) -> error::Result<()>
    {
        let word = match self.executing.last()
            {
                Some(word) => word.clone(),
                None => return script_error(self, "RECURSE outside of a word.".to_string())
            };
        let location = self.current_location.clone().unwrap_or_default();

        self.execute_word(&location, &word)
    }

    fn run_if(&mut self,
              then_branch: &ActionList,
              else_branch: &Option<ActionList>) -> error::Result<Flow>
    {
        if self.pop_as_bool()?
        {
            return self.run_actions(then_branch);
        }

        match else_branch
        {
            Some(else_branch) => self.run_actions(else_branch),
            None => Ok(Flow::Continue)
        }
    }

    /// Run the `BEGIN` loops.  `UNTIL` tests the flag after the whole body, `WHILE` between the
    /// body and the rest of the loop and `AGAIN` never.
    fn run_begin(&mut self,
                 body: &ActionList,
                 after_while: Option<&ActionList>,
                 until: bool) -> error::Result<Flow>
    {
        loop
        {
            let flow = self.run_actions(body)?;

            if flow != Flow::Continue
            {
                return Ok(flow);
            }

            if let Some(rest) = after_while
            {
                if !self.pop_as_bool()?
                {
                    return Ok(Flow::Continue);
                }

                let flow = self.run_actions(rest)?;

                if flow != Flow::Continue
                {
                    return Ok(flow);
                }
            }
            else if until && self.pop_as_bool()?
            {
                return Ok(Flow::Continue);
            }
        }
    }

    fn bind_locals(&mut self, names: &[String]) -> error::Result<()>
    {
        for name in names.iter()
        {
            let value = self.pop()?;

            if !self.locals.set(name, value)
            {
                return script_error(self, format!("Local {} bound outside of a word.", name));
            }
        }

        Ok(())
    }

    fn fetch_local(&mut self, name: &str) -> error::Result<()>
    {
        match self.locals.get(name).cloned()
        {
            Some(value) =>
                {
                    self.push(value);
                    Ok(())
                },

            None => script_error(self, format!("Local {} has not been bound.", name))
        }
    }

    fn store_local(&mut self, name: &str, value: Value) -> error::Result<()>
    {
        if !self.locals.set(name, value)
        {
            return script_error(self, format!("Local {} set outside of a word.", name));
        }

        Ok(())
    }

    /// Run a counted loop.  With equal start and limit the body doesn't run at all, for `DO` as
    /// well as `?DO`.  A step that would carry the index past the range of an integer ends the
    /// loop.
    fn run_do_loop(&mut self, body: &ActionList, plus_loop: bool) -> error::Result<Flow>
    {
        let start = self.pop_as_int()?;
        let limit = self.pop_as_int()?;

        if start == limit
        {
            return Ok(Flow::Continue);
        }

        let direction: i64 = if limit > start { 1 } else { -1 };
        let mut index = start;

        loop
        {
            self.loop_indices.push(index);

            let flow = self.run_actions(body);

            let _ = self.loop_indices.pop();

            match flow?
            {
                Flow::Continue => {},
                Flow::Leave => break,
                Flow::Exit => return Ok(Flow::Exit)
            }

            let step = if plus_loop
                {
                    match self.pop_as_int()?
                    {
                        0 => direction,
                        step => step
                    }
                }
                else
                {
                    direction
                };

            let Some(next) = index.checked_add(step)
            else
            {
                break;
            };

            index = next;

            let finished = if direction > 0 { index >= limit } else { index <= limit };

            if finished
            {
                break;
            }
        }

        Ok(Flow::Continue)
    }

    /// Compare the selector with each branch's test value, running the first match or the
    /// default.
    fn run_case(&mut self, branches: &[CaseBranch], default: &ActionList) -> error::Result<Flow>
    {
        let selector = self.peek(0)?;

        for branch in branches.iter()
        {
            let flow = self.run_actions(&branch.test)?;

            if flow != Flow::Continue
            {
                return Ok(flow);
            }

            let test = self.pop()?;

            if test == selector
            {
                let _ = self.pop()?;
                return self.run_actions(&branch.body);
            }
        }

        let _ = self.pop()?;
        self.run_actions(default)
    }

    /// Give the latest `CREATE`d word the behavior that followed `DOES>`.
    fn set_does(&mut self, actions: &Arc<ActionList>) -> error::Result<()>
    {
        let latest = match self.dictionary.latest()
            {
                Some(latest) => latest.clone(),
                None => return script_error(self, "DOES> without a CREATEd word.".to_string())
            };

        if !matches!(latest.body(), WordBody::Created | WordBody::Does(_))
        {
            return script_error(self, format!("DOES> can't change {}, it wasn't made by CREATE.",
                                              latest));
        }

        let updated = latest.as_ref().clone().with_body(WordBody::Does(actions.clone()));

        self.dictionary.replace_latest(Arc::new(updated));
        Ok(())
    }
}


impl Default for ForthInterpreter
{
    fn default() -> Self
    {
        Self::new()
    }
}
