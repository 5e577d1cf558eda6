use crate::{ lang::{ code::{ Action,
                             ActionList,
                             CaseBranch },
                     source_buffer::SourceLocation },
             runtime::error::{ self,
                               ErrorKind,
                               ScriptError } };
use std::sync::Arc;



/// Fail with a compile error.  The evaluator fills in the location of the offending token.
fn compile_error<T>(message: &str) -> error::Result<T>
{
    Err(ScriptError::new_with_kind(ErrorKind::CompileError, None, message.to_string(), None))
}



/// What kind of definition is being built.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DefinitionKind
{
    /// A `:` definition, installed under the name when closed.
    Named(String),

    /// A `:NONAME` definition, its execution token is pushed when closed.
    Anonymous,

    /// Opened by a control word used in interpret state.  It runs as soon as its last control
    /// structure is closed and is then thrown away.
    Transient
}


/// Compile time bookkeeping for one open control structure.
#[derive(Clone)]
pub enum ControlFrame
{
    If
    {
        then_branch: ActionList,
        else_branch: Option<ActionList>
    },

    /// The code between `AHEAD` and `THEN` is never run.
    Ahead
    {
        skipped: ActionList
    },

    Begin
    {
        pre: ActionList,
        mid: ActionList,
        in_while: bool
    },

    Do
    {
        body: ActionList,
        conditional: bool
    },

    Case
    {
        branches: Vec<CaseBranch>,
        default: ActionList
    },

    /// One `OF` branch of the enclosing case.  When the `OF` was written before its test value
    /// the test is still empty and receives the next action compiled.
    Of
    {
        test: ActionList,
        body: ActionList
    }
}


impl ControlFrame
{
    /// The word that opened the frame, for error messages.
    fn opening_word(&self) -> &'static str
    {
        match self
        {
            ControlFrame::If { .. } => "IF",
            ControlFrame::Ahead { .. } => "AHEAD",
            ControlFrame::Begin { .. } => "BEGIN",
            ControlFrame::Do { .. } => "DO",
            ControlFrame::Case { .. } => "CASE",
            ControlFrame::Of { .. } => "OF"
        }
    }

    /// The list new actions are appended to while this frame is on top.
    fn target(&mut self) -> &mut ActionList
    {
        match self
        {
            ControlFrame::If { then_branch, else_branch } =>
                match else_branch
                {
                    Some(else_branch) => else_branch,
                    None => then_branch
                },

            ControlFrame::Ahead { skipped } => skipped,

            ControlFrame::Begin { pre, mid, in_while } =>
                if *in_while { mid } else { pre },

            ControlFrame::Do { body, .. } => body,
            ControlFrame::Case { default, .. } => default,

            ControlFrame::Of { test, body } =>
                if test.is_empty() { test } else { body }
        }
    }
}



/// A definition under construction.  Holds the top level action list, the stack of open control
/// frames, each of which accumulates its own nested list, and the names of declared locals.
pub struct Definition
{
    kind: DefinitionKind,
    location: SourceLocation,
    code: ActionList,
    frames: Vec<ControlFrame>,
    locals: Vec<String>,
    pending_locals: Vec<String>,
    does_at: Option<usize>
}


impl Definition
{
    pub fn new(kind: DefinitionKind, location: SourceLocation) -> Definition
    {
        Definition
            {
                kind,
                location,
                code: ActionList::new(),
                frames: Vec::new(),
                locals: Vec::new(),
                pending_locals: Vec::new(),
                does_at: None
            }
    }

    pub fn kind(&self) -> &DefinitionKind
    {
        &self.kind
    }

    /// Where the definition was started.
    pub fn location(&self) -> &SourceLocation
    {
        &self.location
    }

    pub fn is_transient(&self) -> bool
    {
        self.kind == DefinitionKind::Transient
    }

    /// The name being defined, used by `RECURSE` diagnostics and error messages.
    pub fn name(&self) -> String
    {
        match &self.kind
        {
            DefinitionKind::Named(name) => name.clone(),
            DefinitionKind::Anonymous => "<anonymous>".to_string(),
            DefinitionKind::Transient => "<interpreted>".to_string()
        }
    }

    /// Are there control structures still waiting for their closing words?
    pub fn has_open_frames(&self) -> bool
    {
        !self.frames.is_empty()
    }

    fn target(&mut self) -> &mut ActionList
    {
        match self.frames.last_mut()
        {
            Some(frame) => frame.target(),
            None => &mut self.code
        }
    }

    /// Append an action to the innermost open list.
    pub fn push_action(&mut self, action: Action)
    {
        self.target().push(action);
    }

    fn pop_frame(&mut self, closing_word: &str) -> error::Result<ControlFrame>
    {
        match self.frames.pop()
        {
            Some(frame) => Ok(frame),
            None => compile_error(&format!("{} without an open control structure.", closing_word))
        }
    }

    fn mismatch<T>(&mut self, frame: ControlFrame, closing_word: &str) -> error::Result<T>
    {
        let message = format!("{} can't close {}.", closing_word, frame.opening_word());

        self.frames.push(frame);
        compile_error(&message)
    }

    pub fn open_if(&mut self)
    {
        self.frames.push(ControlFrame::If { then_branch: ActionList::new(), else_branch: None });
    }

    pub fn open_else(&mut self) -> error::Result<()>
    {
        match self.frames.last_mut()
        {
            Some(ControlFrame::If { else_branch, .. }) if else_branch.is_none() =>
                {
                    *else_branch = Some(ActionList::new());
                    Ok(())
                },

            Some(ControlFrame::If { .. }) => compile_error("ELSE already seen for this IF."),
            _ => compile_error("ELSE without IF.")
        }
    }

    pub fn open_ahead(&mut self)
    {
        self.frames.push(ControlFrame::Ahead { skipped: ActionList::new() });
    }

    /// Close an `IF` or `AHEAD`.
    pub fn close_then(&mut self) -> error::Result<()>
    {
        match self.pop_frame("THEN")?
        {
            ControlFrame::If { then_branch, else_branch } =>
                {
                    self.push_action(Action::If { then_branch, else_branch });
                    Ok(())
                },

            ControlFrame::Ahead { .. } => Ok(()),
            frame => self.mismatch(frame, "THEN")
        }
    }

    pub fn open_begin(&mut self)
    {
        self.frames.push(ControlFrame::Begin { pre: ActionList::new(),
                                               mid: ActionList::new(),
                                               in_while: false });
    }

    pub fn open_while(&mut self) -> error::Result<()>
    {
        match self.frames.last_mut()
        {
            Some(ControlFrame::Begin { in_while, .. }) if !*in_while =>
                {
                    *in_while = true;
                    Ok(())
                },

            Some(ControlFrame::Begin { .. }) => compile_error("WHILE already seen for this BEGIN."),
            _ => compile_error("WHILE without BEGIN.")
        }
    }

    pub fn close_repeat(&mut self) -> error::Result<()>
    {
        match self.pop_frame("REPEAT")?
        {
            ControlFrame::Begin { pre, mid, in_while: true } =>
                {
                    self.push_action(Action::BeginWhile { pre, mid });
                    Ok(())
                },

            frame @ ControlFrame::Begin { .. } =>
                {
                    self.frames.push(frame);
                    compile_error("REPEAT without WHILE.")
                },

            frame => self.mismatch(frame, "REPEAT")
        }
    }

    pub fn close_until(&mut self) -> error::Result<()>
    {
        match self.pop_frame("UNTIL")?
        {
            ControlFrame::Begin { pre, in_while: false, .. } =>
                {
                    self.push_action(Action::BeginUntil(pre));
                    Ok(())
                },

            frame @ ControlFrame::Begin { .. } =>
                {
                    self.frames.push(frame);
                    compile_error("UNTIL can't close a BEGIN ... WHILE loop.")
                },

            frame => self.mismatch(frame, "UNTIL")
        }
    }

    pub fn close_again(&mut self) -> error::Result<()>
    {
        match self.pop_frame("AGAIN")?
        {
            ControlFrame::Begin { pre, in_while: false, .. } =>
                {
                    self.push_action(Action::BeginAgain(pre));
                    Ok(())
                },

            frame @ ControlFrame::Begin { .. } =>
                {
                    self.frames.push(frame);
                    compile_error("AGAIN can't close a BEGIN ... WHILE loop.")
                },

            frame => self.mismatch(frame, "AGAIN")
        }
    }

    pub fn open_do(&mut self, conditional: bool)
    {
        self.frames.push(ControlFrame::Do { body: ActionList::new(), conditional });
    }

    /// Close a `DO` with either `LOOP` or `+LOOP`.
    pub fn close_loop(&mut self, plus_loop: bool) -> error::Result<()>
    {
        let closing_word = if plus_loop { "+LOOP" } else { "LOOP" };

        match self.pop_frame(closing_word)?
        {
            ControlFrame::Do { body, conditional } =>
                {
                    self.push_action(Action::DoLoop { body, conditional, plus_loop });
                    Ok(())
                },

            frame => self.mismatch(frame, closing_word)
        }
    }

    /// `LEAVE` is only valid with a `DO` loop somewhere in the enclosing structures.
    pub fn compile_leave(&mut self) -> error::Result<()>
    {
        if !self.frames.iter().any(|frame| matches!(frame, ControlFrame::Do { .. }))
        {
            return compile_error("LEAVE outside of a DO loop.");
        }

        self.push_action(Action::Leave);
        Ok(())
    }

    pub fn open_case(&mut self)
    {
        self.frames.push(ControlFrame::Case { branches: Vec::new(), default: ActionList::new() });
    }

    /// Start an `OF` branch.  The value test is the last action compiled into the case, or if
    /// there isn't one, the next action compiled.
    pub fn open_of(&mut self) -> error::Result<()>
    {
        let test = match self.frames.last_mut()
            {
                Some(ControlFrame::Case { default, .. }) => default.pop().into_iter().collect(),
                _ => return compile_error("OF without CASE.")
            };

        self.frames.push(ControlFrame::Of { test, body: ActionList::new() });
        Ok(())
    }

    pub fn close_endof(&mut self) -> error::Result<()>
    {
        match self.pop_frame("ENDOF")?
        {
            ControlFrame::Of { test, body } =>
                {
                    if test.is_empty()
                    {
                        return compile_error("OF branch is missing its test value.");
                    }

                    match self.frames.last_mut()
                    {
                        Some(ControlFrame::Case { branches, .. }) =>
                            {
                                branches.push(CaseBranch { test, body });
                                Ok(())
                            },

                        _ => compile_error("ENDOF without CASE.")
                    }
                },

            frame => self.mismatch(frame, "ENDOF")
        }
    }

    pub fn close_endcase(&mut self) -> error::Result<()>
    {
        match self.pop_frame("ENDCASE")?
        {
            ControlFrame::Case { branches, default } =>
                {
                    self.push_action(Action::Case { branches, default });
                    Ok(())
                },

            frame => self.mismatch(frame, "ENDCASE")
        }
    }

    /// Is the name a local declared in this definition?
    pub fn is_local(&self, name: &str) -> bool
    {
        let name = name.to_uppercase();
        self.locals.contains(&name) || self.pending_locals.contains(&name)
    }

    /// Declare a set of locals at once, as `LOCALS|` does.
    pub fn declare_locals(&mut self, names: Vec<String>)
    {
        let names: Vec<String> = names.iter().map(|name| name.to_uppercase()).collect();

        self.locals.extend(names.iter().cloned());
        self.push_action(Action::BindLocals(names));
    }

    /// Declare one local as `(LOCAL)` does.  An empty name ends the group, binding all names
    /// declared since the last group.
    pub fn declare_local(&mut self, name: &str)
    {
        if name.is_empty()
        {
            let names = std::mem::take(&mut self.pending_locals);

            if !names.is_empty()
            {
                self.locals.extend(names.iter().cloned());
                self.push_action(Action::BindLocals(names));
            }
        }
        else
        {
            self.pending_locals.push(name.to_uppercase());
        }
    }

    /// Mark where `DOES>` appeared, the actions after this point become the run time behavior of
    /// the words the definition creates.
    pub fn mark_does(&mut self) -> error::Result<()>
    {
        if self.has_open_frames()
        {
            return compile_error("DOES> inside of a control structure.");
        }

        if self.does_at.is_some()
        {
            return compile_error("DOES> used twice in one definition.");
        }

        if self.is_transient()
        {
            return compile_error("DOES> outside of a definition.");
        }

        self.does_at = Some(self.code.len());
        Ok(())
    }

    /// Take the finished action list for a transient definition whose frames have all closed.
    pub fn take_code(&mut self) -> ActionList
    {
        std::mem::take(&mut self.code)
    }

    /// Close the definition, checking that every control structure has been closed.
    pub fn finish(mut self) -> error::Result<( DefinitionKind, ActionList )>
    {
        if let Some(frame) = self.frames.last()
        {
            return compile_error(&format!("Unclosed {} in definition of {}.",
                                          frame.opening_word(),
                                          self.name()));
        }

        if !self.pending_locals.is_empty()
        {
            self.declare_local("");
        }

        if let Some(index) = self.does_at
        {
            let does_code = self.code.split_off(index);
            self.code.push(Action::SetDoes(Arc::new(does_code)));
        }

        Ok(( self.kind, self.code ))
    }
}


#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{ lang::code::decompile,
                 runtime::data_structures::value::Value };

    fn definition() -> Definition
    {
        Definition::new(DefinitionKind::Named("T".to_string()), SourceLocation::new())
    }

    fn push(definition: &mut Definition, value: i64)
    {
        definition.push_action(Action::Push(Value::Int(value)));
    }

    fn finished(definition: Definition) -> String
    {
        let ( _, code ) = definition.finish().unwrap();
        decompile(&code)
    }

    #[test]
    fn if_else_then_nests_branches()
    {
        let mut definition = definition();

        definition.open_if();
        push(&mut definition, 1);
        definition.open_else().unwrap();
        push(&mut definition, 2);
        definition.close_then().unwrap();
        push(&mut definition, 3);

        assert_eq!(finished(definition), "IF 1 ELSE 2 THEN 3");
    }

    #[test]
    fn ahead_discards_its_body()
    {
        let mut definition = definition();

        definition.open_ahead();
        push(&mut definition, 1);
        definition.close_then().unwrap();
        push(&mut definition, 2);

        assert_eq!(finished(definition), "2");
    }

    #[test]
    fn mismatched_closers_are_compile_errors()
    {
        let mut definition = definition();

        assert_eq!(definition.close_then().unwrap_err().kind(), ErrorKind::CompileError);

        definition.open_begin();
        assert!(definition.close_loop(false).is_err());
        assert!(definition.close_repeat().is_err());
        assert!(definition.close_endof().is_err());

        // The failed closers leave the BEGIN frame in place.
        assert!(definition.close_until().is_ok());
        assert!(!definition.has_open_frames());
    }

    #[test]
    fn while_rules()
    {
        let mut definition = definition();

        assert!(definition.open_while().is_err());

        definition.open_begin();
        definition.open_while().unwrap();
        assert!(definition.open_while().is_err());
        assert!(definition.close_until().is_err());
        assert!(definition.close_again().is_err());
        assert!(definition.close_repeat().is_ok());
    }

    #[test]
    fn leave_needs_an_enclosing_do()
    {
        let mut definition = definition();

        assert!(definition.compile_leave().is_err());

        definition.open_do(false);
        definition.open_if();
        assert!(definition.compile_leave().is_ok());
        definition.close_then().unwrap();
        definition.close_loop(false).unwrap();

        assert_eq!(finished(definition), "DO IF LEAVE THEN LOOP");
    }

    #[test]
    fn of_accepts_test_before_or_after()
    {
        let mut definition = definition();

        definition.open_case();
        push(&mut definition, 5);
        definition.open_of().unwrap();
        push(&mut definition, 100);
        definition.close_endof().unwrap();

        definition.open_of().unwrap();
        push(&mut definition, 10);
        push(&mut definition, 200);
        definition.close_endof().unwrap();

        push(&mut definition, 300);
        definition.close_endcase().unwrap();

        assert_eq!(finished(definition), "CASE 5 OF 100 ENDOF 10 OF 200 ENDOF 300 ENDCASE");
    }

    #[test]
    fn unclosed_frames_fail_the_definition()
    {
        let mut definition = definition();

        definition.open_do(true);

        assert!(definition.finish().is_err());
    }

    #[test]
    fn does_splits_the_body()
    {
        let mut definition = definition();

        push(&mut definition, 1);
        definition.mark_does().unwrap();
        push(&mut definition, 2);

        let ( _, code ) = definition.finish().unwrap();

        assert_eq!(code.len(), 2);
        assert!(matches!(code[1], Action::SetDoes(_)));
    }

    #[test]
    fn locals_are_case_insensitive()
    {
        let mut definition = definition();

        definition.declare_locals(vec![ "a".to_string(), "B".to_string() ]);

        assert!(definition.is_local("A"));
        assert!(definition.is_local("b"));
        assert!(!definition.is_local("c"));

        definition.declare_local("c");
        assert!(definition.is_local("C"));
        definition.declare_local("");

        assert_eq!(finished(definition), "LOCALS| A B | LOCALS| C |");
    }
}
